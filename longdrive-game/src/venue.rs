//! Venues: themed settings that perturb wind and altitude.
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::CatalogError;
use crate::profile::ProfileAggregate;
use crate::progression::level_from_xp;
use crate::weather::{AmbientConditions, WeatherCatalog};

const DEFAULT_VENUE_DATA: &str = include_str!("../assets/data/venues.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    #[default]
    Coins,
    Gems,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueDef {
    pub id: String,
    pub name: String,
    /// Weather condition id used for every drive at this venue.
    pub weather: String,
    /// Signed mean wind in mph; positive is a tailwind.
    pub base_wind: f64,
    pub wind_variance: f64,
    /// Fractional carry bonus from thin air.
    pub altitude_bonus: f64,
    pub unlock_level: u32,
    pub unlock_cost: u64,
    #[serde(default)]
    pub currency: Currency,
    pub tier: u8,
    #[serde(default)]
    pub night: bool,
}

impl VenueDef {
    #[must_use]
    pub const fn is_free(&self) -> bool {
        self.unlock_cost == 0
    }

    /// Ambient conditions for a drive at this venue.
    ///
    /// # Errors
    ///
    /// Returns an error if the venue's weather id is not in the weather table.
    pub fn conditions<R: Rng + ?Sized>(
        &self,
        weather: &WeatherCatalog,
        rng: &mut R,
    ) -> Result<AmbientConditions, CatalogError> {
        let weather = weather.get(&self.weather)?.clone();
        let jitter = if self.wind_variance > 0.0 {
            rng.gen_range(-self.wind_variance..=self.wind_variance)
        } else {
            0.0
        };
        let wind_mph = self.base_wind + jitter;
        log::debug!("venue {} weather {} wind {wind_mph:.1} mph", self.id, weather.id);
        Ok(AmbientConditions {
            weather,
            wind_mph,
            altitude_bonus: self.altitude_bonus,
            night_mode: self.night,
        })
    }
}

/// Why a venue cannot be unlocked right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VenueLockReason {
    AlreadyUnlocked,
    LevelTooLow { required: u32, current: u32 },
    InsufficientFunds {
        currency: Currency,
        required: u64,
        available: u64,
    },
    /// Affordable and level-eligible, but not bought yet.
    NotPurchased { currency: Currency, cost: u64 },
}

/// Purchase delta for the profile collaborator to persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueUnlock {
    pub venue_id: String,
    pub currency: Currency,
    pub cost: u64,
}

/// Whether the player may drive at this venue.
#[must_use]
pub fn is_venue_unlocked(venue: &VenueDef, profile: &ProfileAggregate) -> bool {
    if profile.unlocked_venues.contains(&venue.id) {
        return true;
    }
    venue.is_free() && level_from_xp(profile.xp).level >= venue.unlock_level
}

/// Check level and funds and produce the purchase delta.
///
/// # Errors
///
/// Returns the reason the venue stays locked.
pub fn unlock_venue(
    venue: &VenueDef,
    profile: &ProfileAggregate,
) -> Result<VenueUnlock, VenueLockReason> {
    if is_venue_unlocked(venue, profile) {
        return Err(VenueLockReason::AlreadyUnlocked);
    }
    let current = level_from_xp(profile.xp).level;
    if current < venue.unlock_level {
        return Err(VenueLockReason::LevelTooLow {
            required: venue.unlock_level,
            current,
        });
    }
    let available = match venue.currency {
        Currency::Coins => profile.coins,
        Currency::Gems => profile.gems,
    };
    if available < venue.unlock_cost {
        return Err(VenueLockReason::InsufficientFunds {
            currency: venue.currency,
            required: venue.unlock_cost,
            available,
        });
    }
    Ok(VenueUnlock {
        venue_id: venue.id.clone(),
        currency: venue.currency,
        cost: venue.unlock_cost,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueCatalog {
    pub venues: Vec<VenueDef>,
}

impl VenueCatalog {
    /// Load venues from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed or if validation fails.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: Self = serde_json::from_str(json).map_err(|source| CatalogError::Parse {
            table: "venues",
            source,
        })?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Embedded default venue table.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded asset is malformed.
    pub fn default_config() -> Result<Self, CatalogError> {
        Self::from_json(DEFAULT_VENUE_DATA)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        let mut seen = HashSet::new();
        for venue in &self.venues {
            if !seen.insert(venue.id.as_str()) {
                return Err(CatalogError::DuplicateId {
                    table: "venues",
                    id: venue.id.clone(),
                });
            }
            if venue.wind_variance < 0.0 || !venue.base_wind.is_finite() {
                return Err(CatalogError::malformed(
                    "venues",
                    &venue.id,
                    "wind must be finite with non-negative variance",
                ));
            }
            if !(0.0..1.0).contains(&venue.altitude_bonus) {
                return Err(CatalogError::malformed(
                    "venues",
                    &venue.id,
                    "altitude bonus must be a fraction in 0..1",
                ));
            }
        }
        if self.default_venue().is_none() {
            return Err(CatalogError::malformed(
                "venues",
                "*",
                "at least one free venue is required",
            ));
        }
        Ok(())
    }

    /// Ensure every venue names a known weather condition.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownWeather`] on the first dangling reference.
    pub fn check_weather(&self, weather: &WeatherCatalog) -> Result<(), CatalogError> {
        for venue in &self.venues {
            weather.get(&venue.weather)?;
        }
        Ok(())
    }

    /// Look up a venue by id.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownVenue`] when the id is not in the table.
    pub fn get(&self, id: &str) -> Result<&VenueDef, CatalogError> {
        self.venues
            .iter()
            .find(|v| v.id == id)
            .ok_or_else(|| CatalogError::UnknownVenue(id.to_string()))
    }

    /// First free venue available from level one.
    #[must_use]
    pub fn default_venue(&self) -> Option<&VenueDef> {
        self.venues
            .iter()
            .find(|v| v.is_free() && v.unlock_level <= 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn catalog() -> VenueCatalog {
        VenueCatalog::default_config().unwrap()
    }

    #[test]
    fn default_venue_is_first_free_one() {
        let catalog = catalog();
        let venue = catalog.default_venue().unwrap();
        assert_eq!(venue.id, "driving_range");
        assert!(is_venue_unlocked(venue, &ProfileAggregate::default()));
    }

    #[test]
    fn venue_wind_stays_within_variance() {
        let catalog = catalog();
        let weather = WeatherCatalog::default_config().unwrap();
        catalog.check_weather(&weather).unwrap();
        let venue = catalog.get("coastal_links").unwrap();
        let mut rng = SmallRng::seed_from_u64(5);
        for _ in 0..100 {
            let ambient = venue.conditions(&weather, &mut rng).unwrap();
            assert!((ambient.wind_mph - venue.base_wind).abs() <= venue.wind_variance + 1e-9);
            assert_eq!(ambient.weather.id, "gusty");
        }
    }

    #[test]
    fn night_venue_flags_night_mode() {
        let catalog = catalog();
        let weather = WeatherCatalog::default_config().unwrap();
        let mut rng = SmallRng::seed_from_u64(1);
        let ambient = catalog
            .get("neon_night")
            .unwrap()
            .conditions(&weather, &mut rng)
            .unwrap();
        assert!(ambient.night_mode);
    }

    #[test]
    fn unlock_checks_level_then_funds() {
        let catalog = catalog();
        let venue = catalog.get("coastal_links").unwrap();
        let mut profile = ProfileAggregate::default();
        assert!(matches!(
            unlock_venue(venue, &profile),
            Err(VenueLockReason::LevelTooLow { required: 3, .. })
        ));

        profile.xp = 10_000;
        assert!(matches!(
            unlock_venue(venue, &profile),
            Err(VenueLockReason::InsufficientFunds { .. })
        ));

        profile.coins = 600;
        let unlock = unlock_venue(venue, &profile).unwrap();
        assert_eq!(unlock.cost, 500);
        assert_eq!(unlock.currency, Currency::Coins);

        profile.unlocked_venues.insert(venue.id.clone());
        assert_eq!(
            unlock_venue(venue, &profile),
            Err(VenueLockReason::AlreadyUnlocked)
        );
    }

    #[test]
    fn unknown_venue_fails_fast() {
        assert!(matches!(
            catalog().get("moon"),
            Err(CatalogError::UnknownVenue(_))
        ));
    }
}
