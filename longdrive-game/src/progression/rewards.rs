use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::ChestType;
use crate::constants::{
    DRIVE_BASE_XP, DRIVE_COIN_YARDS_PER_COIN, DRIVE_IN_BOUNDS_XP, DRIVE_XP_YARDS_PER_POINT,
    FREEPLAY_CHEST_INTERVAL, LEGENDARY_CHEST_DISTANCE, PERSONAL_BEST_COINS,
};
use crate::numbers::floor_f64_to_u64;
use crate::profile::ProfileAggregate;
use crate::result::DriveResult;

/// Contest consequences of the drive being rewarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DriveOutcome {
    pub round_won: bool,
    pub contest_won: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DriveRewards {
    pub xp: u64,
    pub coins: u64,
    pub personal_best: bool,
    pub contest_wins: u32,
    pub chests: SmallVec<[ChestType; 2]>,
}

/// Chests earned by one drive. `drive_number` is the profile's drive count
/// including this drive.
#[must_use]
pub fn chests_for_drive(
    result: &DriveResult,
    drive_number: u32,
    outcome: DriveOutcome,
) -> SmallVec<[ChestType; 2]> {
    let mut chests = SmallVec::new();
    if drive_number > 0 && drive_number % FREEPLAY_CHEST_INTERVAL == 0 {
        chests.push(ChestType::Wooden);
    }
    if outcome.round_won {
        chests.push(ChestType::Silver);
    }
    if outcome.contest_won {
        chests.push(ChestType::Gold);
    }
    if result.in_bounds && result.total >= LEGENDARY_CHEST_DISTANCE {
        chests.push(ChestType::Legendary);
    }
    chests
}

/// XP, coins and chests for one landed drive against the pre-drive profile.
#[must_use]
pub fn drive_rewards(
    result: &DriveResult,
    profile: &ProfileAggregate,
    outcome: DriveOutcome,
) -> DriveRewards {
    let mut xp = DRIVE_BASE_XP;
    let mut coins = 0;
    let mut personal_best = false;
    if !result.timed_out {
        xp += floor_f64_to_u64(result.total / DRIVE_XP_YARDS_PER_POINT);
    }
    if result.in_bounds {
        xp += DRIVE_IN_BOUNDS_XP;
        coins += floor_f64_to_u64(result.total / DRIVE_COIN_YARDS_PER_COIN);
        if result.total > profile.best_distance {
            personal_best = true;
            coins += PERSONAL_BEST_COINS;
        }
    }
    DriveRewards {
        xp,
        coins,
        personal_best,
        contest_wins: u32::from(outcome.contest_won),
        chests: chests_for_drive(result, profile.total_drives.saturating_add(1), outcome),
    }
}
