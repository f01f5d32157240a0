//! Shot state machine: charge power, lock, charge accuracy, fire, land.
//!
//! Transitions happen on the three triggers plus [`ShotMachine::advance`],
//! which ticks whichever single timer is live for the current phase.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{
    ACCURACY_OSCILLATOR_SPEED, FLIGHT_FRAME_SECONDS, MAX_FLIGHT_FRAMES, POWER_OSCILLATOR_SPEED,
};
use crate::equipment::BonusSet;
use crate::error::ShotError;
use crate::numbers::{ceil_f64_to_usize, usize_to_f64};
use crate::oscillator::Oscillator;
use crate::result::DriveResult;
use crate::trajectory::{DriveParams, FlightPoint, simulate_drive};
use crate::weather::AmbientConditions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShotPhase {
    #[default]
    Idle,
    Powering,
    Aiming,
    Flying,
    Landed,
}

/// Everything fixed for the duration of one shot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShotSetup {
    /// Venue the shot is struck at; `None` on the open range.
    pub venue_id: Option<String>,
    pub ambient: AmbientConditions,
    pub driver: BonusSet,
    pub ball: BonusSet,
    /// Seconds on the shot clock; `None` outside contest mode.
    pub shot_clock: Option<f64>,
}

/// Outbound notification produced by a trigger or tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShotEvent {
    Meter {
        phase: ShotPhase,
        value: f64,
        clock_remaining: Option<f64>,
    },
    FlightFrame {
        index: usize,
        point: FlightPoint,
    },
    Landed(DriveResult),
}

#[derive(Debug, Clone)]
struct FlightPlayback {
    points: Vec<FlightPoint>,
    stride: usize,
    cursor: usize,
    pending: f64,
    result: DriveResult,
}

impl FlightPlayback {
    fn new(points: Vec<FlightPoint>, result: DriveResult) -> Self {
        let frames = usize_to_f64(points.len()) / usize_to_f64(MAX_FLIGHT_FRAMES);
        let stride = ceil_f64_to_usize(frames).max(1);
        Self {
            points,
            stride,
            cursor: 0,
            pending: 0.0,
            result,
        }
    }

    fn last_index(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    fn is_complete(&self) -> bool {
        self.cursor >= self.last_index()
    }

    fn advance(&mut self, dt: f64) {
        if dt.is_finite() && dt > 0.0 {
            self.pending += dt;
        }
        while self.pending >= FLIGHT_FRAME_SECONDS && !self.is_complete() {
            self.pending -= FLIGHT_FRAME_SECONDS;
            self.cursor = (self.cursor + self.stride).min(self.last_index());
        }
    }
}

/// Working state for exactly one shot.
#[derive(Debug, Clone, Default)]
pub struct ShotMachine {
    phase: ShotPhase,
    setup: Option<ShotSetup>,
    power_meter: Option<Oscillator>,
    accuracy_meter: Option<Oscillator>,
    clock_remaining: Option<f64>,
    playback: Option<FlightPlayback>,
    power: f64,
    accuracy: f64,
    result: Option<DriveResult>,
}

impl ShotMachine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn phase(&self) -> ShotPhase {
        self.phase
    }

    #[must_use]
    pub fn setup(&self) -> Option<&ShotSetup> {
        self.setup.as_ref()
    }

    /// Reading of the live meter, or the frozen value once locked.
    #[must_use]
    pub fn meter_value(&self) -> f64 {
        match self.phase {
            ShotPhase::Powering => self.power_meter.map_or(self.power, |m| m.value()),
            ShotPhase::Aiming => self.accuracy_meter.map_or(self.accuracy, |m| m.value()),
            _ => self.accuracy,
        }
    }

    #[must_use]
    pub const fn locked_power(&self) -> f64 {
        self.power
    }

    #[must_use]
    pub const fn clock_remaining(&self) -> Option<f64> {
        self.clock_remaining
    }

    /// Landed result, available from `Landed` until the next reset.
    #[must_use]
    pub fn result(&self) -> Option<&DriveResult> {
        self.result.as_ref()
    }

    /// Flight points of the shot in the air, if any.
    #[must_use]
    pub fn flight_points(&self) -> Option<&[FlightPoint]> {
        self.playback.as_ref().map(|p| p.points.as_slice())
    }

    /// True while any meter, clock or flight animation is still ticking.
    #[must_use]
    pub fn has_live_timer(&self) -> bool {
        self.power_meter.is_some()
            || self.accuracy_meter.is_some()
            || self.clock_remaining.is_some()
            || self.playback.is_some()
    }

    /// `idle → powering`: start the power meter and, in contest mode, the shot clock.
    ///
    /// # Errors
    ///
    /// Returns [`ShotError::InvalidTrigger`] unless the machine is idle.
    pub fn start_charge(&mut self, setup: ShotSetup) -> Result<(), ShotError> {
        if self.phase != ShotPhase::Idle {
            return Err(ShotError::InvalidTrigger {
                trigger: "start_charge",
                phase: self.phase,
            });
        }
        self.clock_remaining = setup.shot_clock;
        self.setup = Some(setup);
        self.power_meter = Some(Oscillator::new(POWER_OSCILLATOR_SPEED));
        self.phase = ShotPhase::Powering;
        log::debug!("shot: idle -> powering");
        Ok(())
    }

    /// Freeze the live meter. Called twice per shot: once to lock power, once to
    /// lock accuracy and strike the ball.
    ///
    /// # Errors
    ///
    /// Returns [`ShotError::InvalidTrigger`] outside `powering`/`aiming`, or the
    /// simulator's error if the frozen values are rejected.
    pub fn lock_current_phase<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<ShotPhase, ShotError> {
        match self.phase {
            ShotPhase::Powering => {
                let meter = self.power_meter.take();
                self.power = meter.map_or(0.0, |m| m.value());
                self.accuracy_meter = Some(Oscillator::new(ACCURACY_OSCILLATOR_SPEED));
                self.phase = ShotPhase::Aiming;
                log::debug!("shot: power locked at {:.1}", self.power);
            }
            ShotPhase::Aiming => {
                let meter = self.accuracy_meter.take();
                self.accuracy = meter.map_or(0.0, |m| m.value());
                self.clock_remaining = None;
                self.launch(rng)?;
            }
            phase => {
                return Err(ShotError::InvalidTrigger {
                    trigger: "lock_current_phase",
                    phase,
                });
            }
        }
        Ok(self.phase)
    }

    fn launch<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), ShotError> {
        let Some(setup) = self.setup.as_ref() else {
            return Err(ShotError::InvalidTrigger {
                trigger: "lock_current_phase",
                phase: self.phase,
            });
        };
        let params = DriveParams {
            power: self.power,
            accuracy: self.accuracy,
            wind_mph: setup.ambient.wind_mph,
            driver: setup.driver,
            ball: setup.ball,
            weather: &setup.ambient.weather,
            altitude_bonus: setup.ambient.altitude_bonus,
        };
        let flight = simulate_drive(&params, rng)?;
        let result = DriveResult::from_flight(&flight, self.power, self.accuracy, &setup.ambient);
        self.playback = Some(FlightPlayback::new(flight.flight_points, result));
        self.phase = ShotPhase::Flying;
        log::debug!("shot: accuracy locked at {:.1}, ball in flight", self.accuracy);
        Ok(())
    }

    /// Tick the live timer by `dt` seconds.
    pub fn advance(&mut self, dt: f64) -> Option<ShotEvent> {
        match self.phase {
            ShotPhase::Powering | ShotPhase::Aiming => {
                if let Some(remaining) = self.clock_remaining.as_mut() {
                    if dt.is_finite() && dt > 0.0 {
                        *remaining -= dt;
                    }
                    if *remaining <= 0.0 {
                        return Some(self.expire_clock());
                    }
                }
                let meter = if self.phase == ShotPhase::Powering {
                    self.power_meter.as_mut()
                } else {
                    self.accuracy_meter.as_mut()
                };
                let value = meter.map_or(0.0, |m| m.advance(dt));
                Some(ShotEvent::Meter {
                    phase: self.phase,
                    value,
                    clock_remaining: self.clock_remaining,
                })
            }
            ShotPhase::Flying => {
                let playback = self.playback.as_mut()?;
                playback.advance(dt);
                if playback.is_complete() {
                    let result = playback.result.clone();
                    self.playback = None;
                    self.result = Some(result.clone());
                    self.phase = ShotPhase::Landed;
                    log::debug!("shot: landed at {:.1} yards", result.total);
                    return Some(ShotEvent::Landed(result));
                }
                let index = playback.cursor;
                playback.points.get(index).map(|point| ShotEvent::FlightFrame {
                    index,
                    point: *point,
                })
            }
            ShotPhase::Idle | ShotPhase::Landed => None,
        }
    }

    fn expire_clock(&mut self) -> ShotEvent {
        if self.phase == ShotPhase::Powering {
            self.power = self.power_meter.map_or(0.0, |m| m.value());
        } else {
            self.accuracy = self.accuracy_meter.map_or(0.0, |m| m.value());
        }
        self.power_meter = None;
        self.accuracy_meter = None;
        self.clock_remaining = None;
        let ambient = self
            .setup
            .as_ref()
            .map_or_else(AmbientConditions::still, |s| s.ambient.clone());
        let miss = DriveResult::shot_clock_miss(self.power, self.accuracy, &ambient);
        self.result = Some(miss.clone());
        self.phase = ShotPhase::Landed;
        log::debug!("shot: clock expired");
        ShotEvent::Landed(miss)
    }

    /// Return to `idle` from any phase, stopping every live timer.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
