use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::{BTreeSet, HashSet};

use crate::equipment::Rarity;
use crate::error::CatalogError;
use crate::profile::ProfileAggregate;
use crate::venue::{VenueCatalog, is_venue_unlocked};

const DEFAULT_ACHIEVEMENT_DATA: &str = include_str!("../../assets/data/achievements.json");

/// Threshold predicate evaluated against an [`AchievementContext`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AchievementRequirement {
    Drives(u32),
    Distance(f64),
    Streak(u32),
    Xp(u64),
    ContestWins(u32),
    VenuesUnlocked(usize),
    OwnsRarity(Rarity),
}

impl AchievementRequirement {
    #[must_use]
    pub fn is_met(&self, ctx: &AchievementContext) -> bool {
        match *self {
            Self::Drives(n) => ctx.total_drives >= n,
            Self::Distance(yards) => ctx.best_distance >= yards,
            Self::Streak(n) => ctx.current_streak >= n,
            Self::Xp(xp) => ctx.xp >= xp,
            Self::ContestWins(n) => ctx.contest_wins >= n,
            Self::VenuesUnlocked(n) => ctx.venues_unlocked >= n,
            Self::OwnsRarity(rarity) => ctx.best_rarity.is_some_and(|owned| owned >= rarity),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementDef {
    pub id: String,
    pub name: String,
    pub requirement: AchievementRequirement,
    #[serde(default)]
    pub coins: u64,
    #[serde(default)]
    pub gems: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementCatalog {
    pub achievements: Vec<AchievementDef>,
}

impl AchievementCatalog {
    /// Load achievements from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed or if validation fails.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: Self = serde_json::from_str(json).map_err(|source| CatalogError::Parse {
            table: "achievements",
            source,
        })?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Embedded default achievements.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded asset is malformed.
    pub fn default_config() -> Result<Self, CatalogError> {
        Self::from_json(DEFAULT_ACHIEVEMENT_DATA)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        let mut seen = HashSet::new();
        for def in &self.achievements {
            if !seen.insert(def.id.as_str()) {
                return Err(CatalogError::DuplicateId {
                    table: "achievements",
                    id: def.id.clone(),
                });
            }
            if let AchievementRequirement::Distance(yards) = def.requirement
                && (!yards.is_finite() || yards <= 0.0)
            {
                return Err(CatalogError::malformed(
                    "achievements",
                    &def.id,
                    "distance threshold must be positive",
                ));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&AchievementDef> {
        self.achievements.iter().find(|def| def.id == id)
    }
}

/// Normalized view of the profile that achievement predicates read.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AchievementContext {
    pub total_drives: u32,
    pub best_distance: f64,
    pub current_streak: u32,
    pub xp: u64,
    pub contest_wins: u32,
    pub venues_unlocked: usize,
    pub best_rarity: Option<Rarity>,
}

impl AchievementContext {
    /// Snapshot of `profile`. Venues count when [`is_venue_unlocked`] holds,
    /// so free venues within reach are included.
    #[must_use]
    pub fn from_profile(profile: &ProfileAggregate, venues: &VenueCatalog) -> Self {
        Self {
            total_drives: profile.total_drives,
            best_distance: profile.best_distance,
            current_streak: profile.current_streak,
            xp: profile.xp,
            contest_wins: profile.contest_wins,
            venues_unlocked: venues
                .venues
                .iter()
                .filter(|venue| is_venue_unlocked(venue, profile))
                .count(),
            best_rarity: profile.best_owned_rarity(),
        }
    }
}

/// Ids of achievements that are satisfied and not yet unlocked, in catalog order.
#[must_use]
pub fn check_achievements(
    catalog: &AchievementCatalog,
    already_unlocked: &BTreeSet<String>,
    ctx: &AchievementContext,
) -> SmallVec<[String; 4]> {
    catalog
        .achievements
        .iter()
        .filter(|def| !already_unlocked.contains(&def.id))
        .filter(|def| def.requirement.is_met(ctx))
        .map(|def| def.id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> AchievementContext {
        AchievementContext {
            total_drives: 120,
            best_distance: 312.0,
            current_streak: 6,
            xp: 1_200,
            contest_wins: 1,
            venues_unlocked: 1,
            best_rarity: Some(Rarity::Epic),
        }
    }

    #[test]
    fn venue_count_includes_free_venues_in_reach() {
        let venues = VenueCatalog::default_config().unwrap();
        let fresh = AchievementContext::from_profile(&ProfileAggregate::default(), &venues);
        assert_eq!(fresh.venues_unlocked, 1);

        let mut profile = ProfileAggregate::default();
        profile.unlocked_venues.insert("coastal_links".to_string());
        let ctx = AchievementContext::from_profile(&profile, &venues);
        assert_eq!(ctx.venues_unlocked, 2);
    }

    #[test]
    fn requirements_parse_from_tagged_json() {
        let catalog = AchievementCatalog::default_config().unwrap();
        assert_eq!(
            catalog.get("epic_owner").unwrap().requirement,
            AchievementRequirement::OwnsRarity(Rarity::Epic)
        );
        assert_eq!(
            catalog.get("distance_300").unwrap().requirement,
            AchievementRequirement::Distance(300.0)
        );
    }

    #[test]
    fn returns_only_newly_satisfied_ids() {
        let catalog = AchievementCatalog::default_config().unwrap();
        let ctx = context();
        let mut unlocked = BTreeSet::new();
        unlocked.insert("first_drive".to_string());
        let fresh = check_achievements(&catalog, &unlocked, &ctx);
        assert!(!fresh.iter().any(|id| id == "first_drive"));
        for id in ["drives_100", "distance_300", "streak_5", "xp_1000", "first_title", "epic_owner"] {
            assert!(fresh.iter().any(|f| f == id), "{id} should unlock");
        }
        for id in ["distance_350", "legendary_owner", "globetrotter", "dynasty"] {
            assert!(!fresh.iter().any(|f| f == id), "{id} should stay locked");
        }
    }

    #[test]
    fn second_pass_is_empty() {
        let catalog = AchievementCatalog::default_config().unwrap();
        let ctx = context();
        let mut unlocked = BTreeSet::new();
        let first = check_achievements(&catalog, &unlocked, &ctx);
        assert!(!first.is_empty());
        unlocked.extend(first);
        assert!(check_achievements(&catalog, &unlocked, &ctx).is_empty());
    }
}
