//! Static tables bundled for startup validation.
use crate::contest::OpponentCatalog;
use crate::equipment::{EquipmentCatalog, EquipmentSlot};
use crate::error::CatalogError;
use crate::progression::{AchievementCatalog, ChallengeCatalog, ChestConfig, DivisionTable};
use crate::venue::VenueCatalog;
use crate::weather::WeatherCatalog;

/// Every catalog the engine reads. Never mutated after load.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalogs {
    pub equipment: EquipmentCatalog,
    pub weather: WeatherCatalog,
    pub venues: VenueCatalog,
    pub opponents: OpponentCatalog,
    pub chests: ChestConfig,
    pub divisions: DivisionTable,
    pub achievements: AchievementCatalog,
    pub challenges: ChallengeCatalog,
}

impl Catalogs {
    /// Load and cross-validate the embedded tables.
    ///
    /// # Errors
    ///
    /// Returns the first configuration error found.
    pub fn load_default() -> Result<Self, CatalogError> {
        let catalogs = Self {
            equipment: EquipmentCatalog::default_config()?,
            weather: WeatherCatalog::default_config()?,
            venues: VenueCatalog::default_config()?,
            opponents: OpponentCatalog::default_config()?,
            chests: ChestConfig::default_config()?,
            divisions: DivisionTable::default_config()?,
            achievements: AchievementCatalog::default_config()?,
            challenges: ChallengeCatalog::default_config()?,
        };
        catalogs.validate()?;
        Ok(catalogs)
    }

    /// Check references between tables.
    ///
    /// # Errors
    ///
    /// Returns an error for a venue naming unknown weather, a challenge naming
    /// an unknown venue, or a chest rarity with no items to drop.
    pub fn validate(&self) -> Result<(), CatalogError> {
        self.venues.check_weather(&self.weather)?;
        for challenge in &self.challenges.venue_challenges {
            self.venues.get(&challenge.venue_id)?;
        }
        for tier in &self.chests.tiers {
            for (rarity, weight) in &tier.rarity_weights {
                if *weight == 0 {
                    continue;
                }
                for slot in EquipmentSlot::ALL {
                    if self.equipment.items_of(*rarity, slot).next().is_none() {
                        return Err(CatalogError::malformed(
                            "chests",
                            &tier.chest_type.to_string(),
                            format!("no {rarity:?} {slot} items to drop"),
                        ));
                    }
                }
            }
        }
        log::debug!(
            "catalogs ready: {} items, {} venues, {} opponents, {} achievements",
            self.equipment.items.len(),
            self.venues.venues.len(),
            self.opponents.opponents.len(),
            self.achievements.achievements.len()
        );
        Ok(())
    }
}

/// Trait for abstracting catalog loading.
/// Platform-specific implementations should provide this
pub trait CatalogLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load every catalog table.
    ///
    /// # Errors
    ///
    /// Returns an error if a table cannot be loaded or fails validation.
    fn load_catalogs(&self) -> Result<Catalogs, Self::Error>;
}

/// Loader backed by the tables compiled into the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedCatalogs;

impl CatalogLoader for EmbeddedCatalogs {
    type Error = CatalogError;

    fn load_catalogs(&self) -> Result<Catalogs, Self::Error> {
        Catalogs::load_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weather::WeatherCatalog;

    #[test]
    fn embedded_tables_cross_validate() {
        let catalogs = EmbeddedCatalogs.load_catalogs().unwrap();
        assert_eq!(catalogs.venues.default_venue().unwrap().id, "driving_range");
    }

    #[test]
    fn dangling_weather_reference_is_fatal() {
        let mut catalogs = Catalogs::load_default().unwrap();
        catalogs.weather = WeatherCatalog::from_json(
            r#"{"conditions":[{"id":"calm","name":"Calm","wind_min":0.0,"wind_max":3.0,"distance_modifier":1.0,"roll_modifier":1.0,"weight":1}]}"#,
        )
        .unwrap();
        assert!(matches!(
            catalogs.validate(),
            Err(CatalogError::UnknownWeather(id)) if id == "gusty"
        ));
    }
}
