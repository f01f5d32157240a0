//! Scored outcome of a single shot.
use serde::{Deserialize, Serialize};

use crate::trajectory::Trajectory;
use crate::weather::AmbientConditions;

/// Value object produced once per shot. Distances are in yards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriveResult {
    pub carry: f64,
    pub roll: f64,
    pub total: f64,
    pub ball_speed: f64,
    pub launch_angle: f64,
    pub wind: f64,
    pub power: f64,
    pub accuracy: f64,
    pub in_bounds: bool,
    pub night_mode: bool,
    /// Set when the shot clock ran out before the ball was struck.
    #[serde(default)]
    pub timed_out: bool,
}

impl DriveResult {
    /// Materialize a result from a scored flight and the inputs that produced it.
    #[must_use]
    pub fn from_flight(
        flight: &Trajectory,
        power: f64,
        accuracy: f64,
        ambient: &AmbientConditions,
    ) -> Self {
        Self {
            carry: flight.carry,
            roll: flight.roll,
            total: flight.carry + flight.roll,
            ball_speed: flight.ball_speed_mph,
            launch_angle: flight.launch_angle_deg,
            wind: ambient.wind_mph,
            power,
            accuracy,
            in_bounds: flight.in_bounds,
            night_mode: ambient.night_mode,
            timed_out: false,
        }
    }

    /// Zero-value miss recorded when the shot clock expires.
    #[must_use]
    pub fn shot_clock_miss(power: f64, accuracy: f64, ambient: &AmbientConditions) -> Self {
        Self {
            carry: 0.0,
            roll: 0.0,
            total: 0.0,
            ball_speed: 0.0,
            launch_angle: 0.0,
            wind: ambient.wind_mph,
            power,
            accuracy,
            in_bounds: false,
            night_mode: ambient.night_mode,
            timed_out: true,
        }
    }

    /// Distance that counts for scoring: the total when in bounds, otherwise zero.
    #[must_use]
    pub fn scoring_distance(&self) -> f64 {
        if self.in_bounds { self.total } else { 0.0 }
    }
}
