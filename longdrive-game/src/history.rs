//! Bounded log of recent drives.
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::constants::DRIVE_HISTORY_CAPACITY;
use crate::result::DriveResult;

/// Most-recent-first drive log capped at a fixed length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriveHistory {
    capacity: usize,
    drives: VecDeque<DriveResult>,
}

impl Default for DriveHistory {
    fn default() -> Self {
        Self::with_capacity(DRIVE_HISTORY_CAPACITY)
    }
}

impl DriveHistory {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            drives: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, result: DriveResult) {
        if self.drives.len() == self.capacity {
            self.drives.pop_back();
        }
        self.drives.push_front(result);
    }

    #[must_use]
    pub fn latest(&self) -> Option<&DriveResult> {
        self.drives.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DriveResult> {
        self.drives.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.drives.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.drives.is_empty()
    }

    /// Consecutive in-bounds drives counting back from the latest.
    #[must_use]
    pub fn in_bounds_streak(&self) -> u32 {
        let streak = self.drives.iter().take_while(|d| d.in_bounds).count();
        u32::try_from(streak).unwrap_or(u32::MAX)
    }

    /// Best in-bounds total still held in the log.
    #[must_use]
    pub fn best_in_bounds(&self) -> Option<f64> {
        self.drives
            .iter()
            .filter(|d| d.in_bounds)
            .map(|d| d.total)
            .reduce(f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weather::AmbientConditions;

    fn drive(total: f64, in_bounds: bool) -> DriveResult {
        let mut result = DriveResult::shot_clock_miss(80.0, 50.0, &AmbientConditions::still());
        result.total = total;
        result.carry = total;
        result.in_bounds = in_bounds;
        result.timed_out = false;
        result
    }

    #[test]
    fn newest_first_and_capped() {
        let mut history = DriveHistory::with_capacity(3);
        for total in [100.0, 200.0, 300.0, 400.0] {
            history.push(drive(total, true));
        }
        assert_eq!(history.len(), 3);
        let totals: Vec<f64> = history.iter().map(|d| d.total).collect();
        assert_eq!(totals, vec![400.0, 300.0, 200.0]);
        assert_eq!(history.best_in_bounds(), Some(400.0));
    }

    #[test]
    fn streak_breaks_on_a_miss() {
        let mut history = DriveHistory::default();
        history.push(drive(250.0, true));
        history.push(drive(260.0, false));
        history.push(drive(270.0, true));
        history.push(drive(280.0, true));
        assert_eq!(history.in_bounds_streak(), 2);
        assert_eq!(history.best_in_bounds(), Some(280.0));
        history.push(drive(0.0, false));
        assert_eq!(history.in_bounds_streak(), 0);
    }
}
