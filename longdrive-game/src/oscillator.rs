//! Triangle-wave meter advanced by explicit ticks.
use serde::{Deserialize, Serialize};

use crate::constants::{OSCILLATOR_MAX, OSCILLATOR_MIN};

const CYCLE: f64 = 2.0 * (OSCILLATOR_MAX - OSCILLATOR_MIN);

/// Sweeps 0 → 100 → 0 at a fixed speed in meter units per second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Oscillator {
    speed: f64,
    /// Position along one full up-and-down cycle.
    cursor: f64,
}

impl Oscillator {
    /// A meter resting at zero, about to rise.
    #[must_use]
    pub const fn new(speed: f64) -> Self {
        Self { speed, cursor: 0.0 }
    }

    /// Current reading in `0..=100`.
    #[must_use]
    pub fn value(&self) -> f64 {
        let span = OSCILLATOR_MAX - OSCILLATOR_MIN;
        if self.cursor <= span {
            OSCILLATOR_MIN + self.cursor
        } else {
            OSCILLATOR_MIN + (CYCLE - self.cursor)
        }
    }

    #[must_use]
    pub fn is_rising(&self) -> bool {
        self.cursor < OSCILLATOR_MAX - OSCILLATOR_MIN
    }

    /// Move the meter forward by `dt` seconds and return the new reading.
    /// Non-finite or negative deltas leave the meter untouched.
    pub fn advance(&mut self, dt: f64) -> f64 {
        if dt.is_finite() && dt > 0.0 {
            self.cursor = (self.cursor + self.speed * dt).rem_euclid(CYCLE);
        }
        self.value()
    }
}
