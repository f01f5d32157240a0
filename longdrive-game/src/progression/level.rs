use serde::{Deserialize, Serialize};

use crate::constants::{MAX_LEVEL, XP_LEVEL_BASE, XP_LEVEL_GROWTH};
use crate::numbers::round_f64_to_u64;

/// Where a cumulative xp total sits on the level ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelProgress {
    pub level: u32,
    pub xp_into_level: u64,
    /// Zero once the level cap is reached.
    pub xp_for_next: u64,
}

/// XP needed to go from `level` to `level + 1`.
#[must_use]
pub fn xp_for_level(level: u32) -> u64 {
    round_f64_to_u64(XP_LEVEL_BASE * f64::from(level) * XP_LEVEL_GROWTH)
}

/// Walk the cumulative thresholds from level 1.
#[must_use]
pub fn level_from_xp(total_xp: u64) -> LevelProgress {
    let mut level = 1;
    let mut remaining = total_xp;
    loop {
        if level >= MAX_LEVEL {
            return LevelProgress {
                level,
                xp_into_level: remaining,
                xp_for_next: 0,
            };
        }
        let needed = xp_for_level(level);
        if remaining < needed {
            return LevelProgress {
                level,
                xp_into_level: remaining,
                xp_for_next: needed,
            };
        }
        remaining -= needed;
        level += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_follow_the_curve() {
        assert_eq!(xp_for_level(1), 150);
        assert_eq!(xp_for_level(4), 600);
        assert_eq!(level_from_xp(0).level, 1);
        assert_eq!(level_from_xp(149).level, 1);
        let two = level_from_xp(150);
        assert_eq!(two.level, 2);
        assert_eq!(two.xp_into_level, 0);
        assert_eq!(two.xp_for_next, 300);
        assert_eq!(level_from_xp(10_000).level, 12);
    }

    #[test]
    fn level_never_regresses() {
        let mut last = 0;
        for xp in (0..50_000).step_by(37) {
            let level = level_from_xp(xp).level;
            assert!(level >= last);
            last = level;
        }
    }

    #[test]
    fn cap_is_respected() {
        let capped = level_from_xp(u64::MAX);
        assert_eq!(capped.level, MAX_LEVEL);
        assert_eq!(capped.xp_for_next, 0);
    }
}
