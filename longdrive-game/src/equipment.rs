//! Equipment catalog: drivers and balls with additive bonuses.
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::error::CatalogError;

const DEFAULT_EQUIPMENT_DATA: &str = include_str!("../assets/data/equipment.json");

pub const STARTER_DRIVER_ID: &str = "starter_driver";
pub const STARTER_BALL_ID: &str = "starter_ball";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquipmentSlot {
    Driver,
    Ball,
}

impl EquipmentSlot {
    pub const ALL: [Self; 2] = [Self::Driver, Self::Ball];
}

impl fmt::Display for EquipmentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Driver => write!(f, "driver"),
            Self::Ball => write!(f, "ball"),
        }
    }
}

/// Item rarity, ordered from most to least common.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    #[default]
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub const ALL: [Self; 5] = [
        Self::Common,
        Self::Uncommon,
        Self::Rare,
        Self::Epic,
        Self::Legendary,
    ];
}

/// Additive bonuses contributed by one piece of equipment.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BonusSet {
    /// Extra ball speed in mph.
    pub speed: f64,
    /// Percentage of the timing miss that is forgiven.
    pub accuracy: f64,
    /// Carry bonus in percent.
    pub distance_pct: f64,
    /// Roll bonus in percent.
    pub roll_pct: f64,
}

impl std::ops::Add for BonusSet {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            speed: self.speed + rhs.speed,
            accuracy: self.accuracy + rhs.accuracy,
            distance_pct: self.distance_pct + rhs.distance_pct,
            roll_pct: self.roll_pct + rhs.roll_pct,
        }
    }
}

/// Immutable catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentDef {
    pub id: String,
    pub name: String,
    pub slot: EquipmentSlot,
    pub rarity: Rarity,
    pub speed_bonus: f64,
    pub accuracy_bonus: f64,
    pub distance_pct: f64,
    pub roll_pct: f64,
    pub dupes_to_upgrade: u32,
}

impl EquipmentDef {
    #[must_use]
    pub const fn bonuses(&self) -> BonusSet {
        BonusSet {
            speed: self.speed_bonus,
            accuracy: self.accuracy_bonus,
            distance_pct: self.distance_pct,
            roll_pct: self.roll_pct,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentCatalog {
    pub items: Vec<EquipmentDef>,
}

impl EquipmentCatalog {
    /// Load the catalog from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed or an entry fails validation.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: Self = serde_json::from_str(json).map_err(|source| CatalogError::Parse {
            table: "equipment",
            source,
        })?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Embedded default catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded asset is malformed.
    pub fn default_config() -> Result<Self, CatalogError> {
        Self::from_json(DEFAULT_EQUIPMENT_DATA)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        if self.items.is_empty() {
            return Err(CatalogError::Empty("equipment"));
        }
        let mut seen = HashSet::new();
        for item in &self.items {
            if !seen.insert((item.id.as_str(), item.slot)) {
                return Err(CatalogError::DuplicateId {
                    table: "equipment",
                    id: item.id.clone(),
                });
            }
            if !(0.0..=100.0).contains(&item.accuracy_bonus) {
                return Err(CatalogError::malformed(
                    "equipment",
                    &item.id,
                    "accuracy bonus must be within 0..=100",
                ));
            }
            let bonuses = [
                item.speed_bonus,
                item.distance_pct,
                item.roll_pct,
                item.accuracy_bonus,
            ];
            if bonuses.iter().any(|b| !b.is_finite() || *b < 0.0) {
                return Err(CatalogError::malformed(
                    "equipment",
                    &item.id,
                    "bonuses must be finite and non-negative",
                ));
            }
            if item.dupes_to_upgrade == 0 {
                return Err(CatalogError::malformed(
                    "equipment",
                    &item.id,
                    "dupes_to_upgrade must be positive",
                ));
            }
        }
        for (id, slot) in [
            (STARTER_DRIVER_ID, EquipmentSlot::Driver),
            (STARTER_BALL_ID, EquipmentSlot::Ball),
        ] {
            self.lookup(id, slot)?;
        }
        Ok(())
    }

    /// Look up an item by id and slot.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownEquipment`] when no such item exists.
    pub fn lookup(&self, id: &str, slot: EquipmentSlot) -> Result<&EquipmentDef, CatalogError> {
        self.items
            .iter()
            .find(|item| item.id == id && item.slot == slot)
            .ok_or_else(|| CatalogError::UnknownEquipment {
                id: id.to_string(),
                slot,
            })
    }

    /// All items of a rarity in one slot, in catalog order.
    pub fn items_of(
        &self,
        rarity: Rarity,
        slot: EquipmentSlot,
    ) -> impl Iterator<Item = &EquipmentDef> {
        self.items
            .iter()
            .filter(move |item| item.rarity == rarity && item.slot == slot)
    }
}

/// The driver and ball a player swings with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loadout {
    pub driver_id: String,
    pub ball_id: String,
}

impl Default for Loadout {
    fn default() -> Self {
        Self {
            driver_id: STARTER_DRIVER_ID.to_string(),
            ball_id: STARTER_BALL_ID.to_string(),
        }
    }
}

impl Loadout {
    /// Resolve driver and ball bonuses from the catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if either id is unknown.
    pub fn bonuses(&self, catalog: &EquipmentCatalog) -> Result<(BonusSet, BonusSet), CatalogError> {
        let driver = catalog.lookup(&self.driver_id, EquipmentSlot::Driver)?;
        let ball = catalog.lookup(&self.ball_id, EquipmentSlot::Ball)?;
        Ok((driver.bonuses(), ball.bonuses()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_covers_every_rarity_and_slot() {
        let catalog = EquipmentCatalog::default_config().unwrap();
        for rarity in Rarity::ALL {
            for slot in EquipmentSlot::ALL {
                assert!(
                    catalog.items_of(rarity, slot).next().is_some(),
                    "missing {rarity:?} {slot}"
                );
            }
        }
    }

    #[test]
    fn lookup_is_keyed_by_slot() {
        let catalog = EquipmentCatalog::default_config().unwrap();
        assert!(catalog.lookup(STARTER_DRIVER_ID, EquipmentSlot::Driver).is_ok());
        let err = catalog
            .lookup(STARTER_DRIVER_ID, EquipmentSlot::Ball)
            .unwrap_err();
        assert!(matches!(err, CatalogError::UnknownEquipment { .. }));
    }

    #[test]
    fn rarity_is_ordered() {
        assert!(Rarity::Common < Rarity::Uncommon);
        assert!(Rarity::Epic < Rarity::Legendary);
        assert_eq!(Rarity::ALL.iter().max(), Some(&Rarity::Legendary));
    }

    #[test]
    fn starter_loadout_has_no_bonuses() {
        let catalog = EquipmentCatalog::default_config().unwrap();
        let (driver, ball) = Loadout::default().bonuses(&catalog).unwrap();
        assert_eq!(driver + ball, BonusSet::default());
    }

    #[test]
    fn rejects_accuracy_bonus_over_hundred() {
        let json = r#"{"items":[
            {"id":"starter_driver","name":"a","slot":"driver","rarity":"common","speed_bonus":0,"accuracy_bonus":120,"distance_pct":0,"roll_pct":0,"dupes_to_upgrade":1},
            {"id":"starter_ball","name":"b","slot":"ball","rarity":"common","speed_bonus":0,"accuracy_bonus":0,"distance_pct":0,"roll_pct":0,"dupes_to_upgrade":1}
        ]}"#;
        let err = EquipmentCatalog::from_json(json).unwrap_err();
        assert!(matches!(err, CatalogError::Malformed { .. }));
    }
}
