//! Centralized balance and tuning constants for the long-drive engine.
//!
//! These values define the deterministic math for the core simulation.
//! Keeping them together ensures that gameplay can only be adjusted via
//! code changes reviewed in version control, rather than through the
//! JSON catalog assets.

// Unit conversion -----------------------------------------------------------
pub(crate) const MPH_TO_MPS: f64 = 0.447_04;
pub(crate) const YARD_TO_METER: f64 = 0.9144;

// Flight model --------------------------------------------------------------
pub(crate) const POWER_TO_MPH: f64 = 1.9;
pub(crate) const BASE_LAUNCH_ANGLE_DEG: f64 = 12.0;
pub(crate) const LAUNCH_ANGLE_SWING_DEG: f64 = 3.0;
/// Accuracy reading that sends the ball dead straight.
pub const ACCURACY_CENTER: f64 = 50.0;
/// Largest accuracy deviation from center that still lands in bounds.
pub const IN_BOUNDS_TOLERANCE: f64 = 30.0;
pub(crate) const SIM_DT: f64 = 1.0 / 60.0;
pub(crate) const GRAVITY_MPS2: f64 = 9.81;
pub(crate) const DRAG_PER_STEP: f64 = 0.999;
pub(crate) const MIN_FLIGHT_POINTS: usize = 3;
pub(crate) const MAX_FLIGHT_STEPS: usize = 2_000;
pub(crate) const ROLL_FACTOR_MIN: f64 = 0.08;
pub(crate) const ROLL_FACTOR_MAX: f64 = 0.14;
pub(crate) const ROLL_ANGLE_PENALTY_PER_DEG: f64 = 0.05;
pub(crate) const ROLL_ANGLE_FACTOR_FLOOR: f64 = 0.5;

// Timing minigame -----------------------------------------------------------
pub(crate) const OSCILLATOR_MIN: f64 = 0.0;
pub(crate) const OSCILLATOR_MAX: f64 = 100.0;
/// Power meter sweep in meter units per second.
pub const POWER_OSCILLATOR_SPEED: f64 = 110.0;
/// Accuracy meter sweep in meter units per second.
pub const ACCURACY_OSCILLATOR_SPEED: f64 = 160.0;
/// Seconds granted per ball in contest mode.
pub const SHOT_CLOCK_SECONDS: f64 = 10.0;
pub(crate) const FLIGHT_FRAME_SECONDS: f64 = 1.0 / 60.0;
/// Upper bound on presented flight frames, regardless of simulated point count.
pub const MAX_FLIGHT_FRAMES: usize = 120;

// Contest -------------------------------------------------------------------
pub(crate) const QUALIFYING_BALLS: u8 = 6;
pub(crate) const BRACKET_BALLS: u8 = 3;
pub(crate) const FINALS_BALLS: u8 = 2;

// History -------------------------------------------------------------------
pub const DRIVE_HISTORY_CAPACITY: usize = 50;

// Progression ---------------------------------------------------------------
pub(crate) const XP_LEVEL_BASE: f64 = 100.0;
pub(crate) const XP_LEVEL_GROWTH: f64 = 1.5;
pub(crate) const MAX_LEVEL: u32 = 200;

// Rewards -------------------------------------------------------------------
pub(crate) const DRIVE_BASE_XP: u64 = 10;
pub(crate) const DRIVE_XP_YARDS_PER_POINT: f64 = 10.0;
pub(crate) const DRIVE_IN_BOUNDS_XP: u64 = 5;
pub(crate) const DRIVE_COIN_YARDS_PER_COIN: f64 = 25.0;
pub(crate) const PERSONAL_BEST_COINS: u64 = 25;
pub(crate) const FREEPLAY_CHEST_INTERVAL: u32 = 10;
pub(crate) const LEGENDARY_CHEST_DISTANCE: f64 = 400.0;
pub const DAILY_CHALLENGE_COUNT: usize = 3;
