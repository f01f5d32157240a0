use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

use crate::constants::DAILY_CHALLENGE_COUNT;
use crate::error::CatalogError;
use crate::result::DriveResult;

const DEFAULT_CHALLENGE_DATA: &str = include_str!("../../assets/data/challenges.json");

/// Single-drive predicate. Every kind except the streak requires the drive to
/// finish in bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChallengeRequirement {
    MinDistance { distance: f64 },
    InBoundsStreak { count: u32 },
    /// Headwind of at least `min_wind` mph.
    IntoHeadwind { min_wind: f64, distance: f64 },
    MaxPower { max_power: f64, distance: f64 },
    NightDrive { distance: f64 },
    DistanceWindow { min: f64, max: f64 },
}

/// Per-drive facts a challenge predicate may read.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriveContext {
    pub distance: f64,
    pub power: f64,
    pub in_bounds: bool,
    pub night_mode: bool,
    /// Signed; negative is a headwind.
    pub wind_mph: f64,
    /// Consecutive in-bounds drives including this one.
    pub streak: u32,
}

impl DriveContext {
    #[must_use]
    pub const fn from_result(result: &DriveResult, streak: u32) -> Self {
        Self {
            distance: result.total,
            power: result.power,
            in_bounds: result.in_bounds,
            night_mode: result.night_mode,
            wind_mph: result.wind,
            streak,
        }
    }
}

#[must_use]
pub fn check_challenge(requirement: &ChallengeRequirement, ctx: &DriveContext) -> bool {
    match *requirement {
        ChallengeRequirement::InBoundsStreak { count } => ctx.in_bounds && ctx.streak >= count,
        _ if !ctx.in_bounds => false,
        ChallengeRequirement::MinDistance { distance } => ctx.distance >= distance,
        ChallengeRequirement::IntoHeadwind { min_wind, distance } => {
            ctx.wind_mph <= -min_wind && ctx.distance >= distance
        }
        ChallengeRequirement::MaxPower {
            max_power,
            distance,
        } => ctx.power <= max_power && ctx.distance >= distance,
        ChallengeRequirement::NightDrive { distance } => ctx.night_mode && ctx.distance >= distance,
        ChallengeRequirement::DistanceWindow { min, max } => {
            (min..=max).contains(&ctx.distance)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueChallengeDef {
    pub id: String,
    pub venue_id: String,
    pub name: String,
    pub requirement: ChallengeRequirement,
    #[serde(default)]
    pub coins: u64,
    #[serde(default)]
    pub gems: u64,
    #[serde(default)]
    pub xp: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyChallengeDef {
    pub id: String,
    pub name: String,
    pub requirement: ChallengeRequirement,
    #[serde(default)]
    pub coins: u64,
    #[serde(default)]
    pub gems: u64,
    #[serde(default)]
    pub xp: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeCatalog {
    pub venue_challenges: Vec<VenueChallengeDef>,
    pub daily_challenges: Vec<DailyChallengeDef>,
}

impl ChallengeCatalog {
    /// Load venue and daily challenges from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed or if validation fails.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: Self = serde_json::from_str(json).map_err(|source| CatalogError::Parse {
            table: "challenges",
            source,
        })?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Embedded default challenges.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded asset is malformed.
    pub fn default_config() -> Result<Self, CatalogError> {
        Self::from_json(DEFAULT_CHALLENGE_DATA)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        let mut seen = HashSet::new();
        let all = self
            .venue_challenges
            .iter()
            .map(|c| (c.id.as_str(), &c.requirement))
            .chain(
                self.daily_challenges
                    .iter()
                    .map(|c| (c.id.as_str(), &c.requirement)),
            );
        for (id, requirement) in all {
            if !seen.insert(id) {
                return Err(CatalogError::DuplicateId {
                    table: "challenges",
                    id: id.to_string(),
                });
            }
            if let ChallengeRequirement::DistanceWindow { min, max } = requirement
                && min > max
            {
                return Err(CatalogError::malformed(
                    "challenges",
                    id,
                    "distance window is inverted",
                ));
            }
        }
        if self.daily_challenges.len() < DAILY_CHALLENGE_COUNT {
            return Err(CatalogError::malformed(
                "challenges",
                "*",
                format!("at least {DAILY_CHALLENGE_COUNT} daily challenges are required"),
            ));
        }
        Ok(())
    }

    pub fn for_venue<'a>(&'a self, venue_id: &'a str) -> impl Iterator<Item = &'a VenueChallengeDef> {
        self.venue_challenges
            .iter()
            .filter(move |c| c.venue_id == venue_id)
    }
}

/// First venue challenge this drive completes, skipping ones already done.
#[must_use]
pub fn first_completed_challenge<'a>(
    catalog: &'a ChallengeCatalog,
    venue_id: &'a str,
    completed: &BTreeSet<String>,
    ctx: &DriveContext,
) -> Option<&'a VenueChallengeDef> {
    catalog
        .for_venue(venue_id)
        .filter(|c| !completed.contains(&c.id))
        .find(|c| check_challenge(&c.requirement, ctx))
}

/// The day's rotation, identical for every client given the same day index.
#[must_use]
pub fn daily_challenges_for(catalog: &ChallengeCatalog, day: u32) -> Vec<&DailyChallengeDef> {
    let mut rng = ChaCha20Rng::seed_from_u64(u64::from(day));
    catalog
        .daily_challenges
        .choose_multiple(&mut rng, DAILY_CHALLENGE_COUNT)
        .collect()
}
