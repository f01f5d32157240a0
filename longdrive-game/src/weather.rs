//! Weather conditions and ambient wind selection.
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::CatalogError;

const DEFAULT_WEATHER_DATA: &str = include_str!("../assets/data/weather.json");

/// A named weather pattern with its wind band and flight modifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherCondition {
    pub id: String,
    pub name: String,
    /// Lower bound of wind magnitude in mph.
    pub wind_min: f64,
    /// Upper bound of wind magnitude in mph.
    pub wind_max: f64,
    pub distance_modifier: f64,
    pub roll_modifier: f64,
    /// Relative selection weight for freeplay drives.
    #[serde(default)]
    pub weight: u32,
}

impl WeatherCondition {
    /// Neutral conditions: no wind and no modifiers.
    #[must_use]
    pub fn still() -> Self {
        Self {
            id: "still".to_string(),
            name: "Still".to_string(),
            wind_min: 0.0,
            wind_max: 0.0,
            distance_modifier: 1.0,
            roll_modifier: 1.0,
            weight: 0,
        }
    }

    /// Draw a signed wind speed; positive values blow toward the target.
    pub fn roll_wind<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let magnitude = if self.wind_max > self.wind_min {
            rng.gen_range(self.wind_min..=self.wind_max)
        } else {
            self.wind_min
        };
        if rng.gen_bool(0.5) { magnitude } else { -magnitude }
    }
}

/// Everything about the surroundings that feeds one drive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmbientConditions {
    pub weather: WeatherCondition,
    pub wind_mph: f64,
    pub altitude_bonus: f64,
    pub night_mode: bool,
}

impl AmbientConditions {
    #[must_use]
    pub fn still() -> Self {
        Self {
            weather: WeatherCondition::still(),
            wind_mph: 0.0,
            altitude_bonus: 0.0,
            night_mode: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherCatalog {
    pub conditions: Vec<WeatherCondition>,
}

impl WeatherCatalog {
    /// Load weather conditions from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed or if validation fails.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: Self = serde_json::from_str(json).map_err(|source| CatalogError::Parse {
            table: "weather",
            source,
        })?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Embedded default weather table.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded asset is malformed.
    pub fn default_config() -> Result<Self, CatalogError> {
        Self::from_json(DEFAULT_WEATHER_DATA)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        if self.conditions.is_empty() {
            return Err(CatalogError::Empty("weather"));
        }
        let mut seen = HashSet::new();
        for condition in &self.conditions {
            if !seen.insert(condition.id.as_str()) {
                return Err(CatalogError::DuplicateId {
                    table: "weather",
                    id: condition.id.clone(),
                });
            }
            if condition.wind_min < 0.0 || condition.wind_min > condition.wind_max {
                return Err(CatalogError::malformed(
                    "weather",
                    &condition.id,
                    format!(
                        "wind range {}..{} is invalid",
                        condition.wind_min, condition.wind_max
                    ),
                ));
            }
            if condition.distance_modifier <= 0.0 || condition.roll_modifier < 0.0 {
                return Err(CatalogError::malformed(
                    "weather",
                    &condition.id,
                    "modifiers must be positive",
                ));
            }
        }
        if self.conditions.iter().all(|c| c.weight == 0) {
            return Err(CatalogError::malformed(
                "weather",
                "*",
                "at least one condition needs a selection weight",
            ));
        }
        Ok(())
    }

    /// Look up a condition by id.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownWeather`] when the id is not in the table.
    pub fn get(&self, id: &str) -> Result<&WeatherCondition, CatalogError> {
        self.conditions
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| CatalogError::UnknownWeather(id.to_string()))
    }

    /// Weighted pick of a weather condition. `None` only for an empty table.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&WeatherCondition> {
        let fallback = self.conditions.first()?;
        let total: u32 = self.conditions.iter().map(|c| c.weight).sum();
        if total == 0 {
            return Some(fallback);
        }
        let mut roll = rng.gen_range(0..total);
        for condition in &self.conditions {
            if condition.weight == 0 {
                continue;
            }
            if roll < condition.weight {
                return Some(condition);
            }
            roll -= condition.weight;
        }
        Some(fallback)
    }
}

/// Ambient conditions for a freeplay drive: weighted weather, then a wind draw.
pub fn select_freeplay_conditions<R: Rng + ?Sized>(
    catalog: &WeatherCatalog,
    rng: &mut R,
) -> AmbientConditions {
    let weather = catalog
        .pick(rng)
        .cloned()
        .unwrap_or_else(WeatherCondition::still);
    let wind_mph = weather.roll_wind(rng);
    log::debug!("freeplay weather {} wind {wind_mph:.1} mph", weather.id);
    AmbientConditions {
        weather,
        wind_mph,
        altitude_bonus: 0.0,
        night_mode: false,
    }
}
