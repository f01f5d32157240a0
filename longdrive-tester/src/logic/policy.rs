use std::fmt;

use clap::ValueEnum;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

/// Meter readings a policy wants to lock for one ball.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwingTarget {
    pub power: f64,
    pub accuracy: f64,
}

impl SwingTarget {
    #[must_use]
    pub const fn new(power: f64, accuracy: f64) -> Self {
        Self { power, accuracy }
    }
}

/// Policy interface for automated swings.
pub trait SwingPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Choose the readings to lock for the next ball.
    fn pick_swing(&mut self) -> SwingTarget;
}

/// Built-in swing strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwingStrategy {
    /// Controlled swing, dead center.
    Steady,
    /// Full power, slightly late on accuracy.
    Aggressive,
    /// Random readings anywhere on the meters.
    Erratic,
}

impl SwingStrategy {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            SwingStrategy::Steady => "Steady",
            SwingStrategy::Aggressive => "Aggressive",
            SwingStrategy::Erratic => "Erratic",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn SwingPolicy> {
        match self {
            SwingStrategy::Steady => Box::new(SteadyPolicy),
            SwingStrategy::Aggressive => Box::new(AggressivePolicy),
            SwingStrategy::Erratic => Box::new(ErraticPolicy::new(seed)),
        }
    }
}

impl fmt::Display for SwingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

struct SteadyPolicy;
struct AggressivePolicy;

struct ErraticPolicy {
    rng: ChaCha20Rng,
}

impl ErraticPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

impl SwingPolicy for SteadyPolicy {
    fn name(&self) -> &'static str {
        "Steady"
    }

    fn pick_swing(&mut self) -> SwingTarget {
        SwingTarget::new(85.0, 50.0)
    }
}

impl SwingPolicy for AggressivePolicy {
    fn name(&self) -> &'static str {
        "Aggressive"
    }

    fn pick_swing(&mut self) -> SwingTarget {
        SwingTarget::new(99.5, 62.0)
    }
}

impl SwingPolicy for ErraticPolicy {
    fn name(&self) -> &'static str {
        "Erratic"
    }

    fn pick_swing(&mut self) -> SwingTarget {
        let power = self.rng.gen_range(20.0..=100.0);
        let accuracy = self.rng.gen_range(0.0..=100.0);
        SwingTarget::new(power, accuracy)
    }
}
