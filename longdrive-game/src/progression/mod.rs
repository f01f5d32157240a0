//! Progression economy: levels, divisions, loot chests, achievements and challenges.
//!
//! Everything here is a pure function of its inputs plus an injected random
//! source. Unlock state lives in [`crate::profile::ProfileAggregate`], never in
//! the definitions.

mod achievements;
mod challenges;
mod chest;
mod division;
mod level;
mod rewards;

pub use achievements::{
    AchievementCatalog, AchievementContext, AchievementDef, AchievementRequirement,
    check_achievements,
};
pub use challenges::{
    ChallengeCatalog, ChallengeRequirement, DailyChallengeDef, DriveContext, VenueChallengeDef,
    check_challenge, daily_challenges_for, first_completed_challenge,
};
pub use chest::{
    ChestConfig, ChestContents, ChestInstance, ChestTier, ChestType, generate_chest_contents,
};
pub use division::{Division, DivisionTable};
pub use level::{LevelProgress, level_from_xp, xp_for_level};
pub use rewards::{DriveOutcome, DriveRewards, chests_for_drive, drive_rewards};
