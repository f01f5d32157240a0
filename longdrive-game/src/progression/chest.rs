use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::equipment::{EquipmentCatalog, EquipmentSlot, Rarity};
use crate::error::CatalogError;
use crate::profile::EquipmentDrop;

const DEFAULT_CHEST_DATA: &str = include_str!("../../assets/data/chests.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChestType {
    Wooden,
    Silver,
    Gold,
    Legendary,
}

impl ChestType {
    pub const ALL: [Self; 4] = [Self::Wooden, Self::Silver, Self::Gold, Self::Legendary];
}

impl fmt::Display for ChestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Wooden => "wooden",
            Self::Silver => "silver",
            Self::Gold => "gold",
            Self::Legendary => "legendary",
        };
        f.write_str(label)
    }
}

/// Loot table for one chest type. Ranges are inclusive `[min, max]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChestTier {
    pub chest_type: ChestType,
    pub coins: [u64; 2],
    pub xp: [u64; 2],
    pub gem_chance: f64,
    pub gems: [u64; 2],
    pub equipment_chance: f64,
    pub rarity_weights: BTreeMap<Rarity, u32>,
}

impl ChestTier {
    fn pick_rarity<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Rarity> {
        let total: u32 = self.rarity_weights.values().sum();
        if total == 0 {
            return None;
        }
        let mut roll = rng.gen_range(0..total);
        for (rarity, weight) in &self.rarity_weights {
            if roll < *weight {
                return Some(*rarity);
            }
            roll -= weight;
        }
        None
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChestConfig {
    pub tiers: Vec<ChestTier>,
}

impl ChestConfig {
    /// Load chest tiers from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed or if validation fails.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let config: Self = serde_json::from_str(json).map_err(|source| CatalogError::Parse {
            table: "chests",
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Embedded default chest tiers.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded asset is malformed.
    pub fn default_config() -> Result<Self, CatalogError> {
        Self::from_json(DEFAULT_CHEST_DATA)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        for chest_type in ChestType::ALL {
            self.tier(chest_type)?;
        }
        for tier in &self.tiers {
            let id = tier.chest_type.to_string();
            for (label, [min, max]) in [("coins", tier.coins), ("xp", tier.xp), ("gems", tier.gems)] {
                if min > max {
                    return Err(CatalogError::malformed(
                        "chests",
                        &id,
                        format!("{label} range {min}..={max} is inverted"),
                    ));
                }
            }
            if !(0.0..=1.0).contains(&tier.gem_chance) || !(0.0..=1.0).contains(&tier.equipment_chance)
            {
                return Err(CatalogError::malformed(
                    "chests",
                    &id,
                    "drop chances must be probabilities",
                ));
            }
            if tier.equipment_chance > 0.0 && tier.rarity_weights.values().all(|w| *w == 0) {
                return Err(CatalogError::malformed(
                    "chests",
                    &id,
                    "equipment drops need a non-empty rarity weight table",
                ));
            }
        }
        Ok(())
    }

    /// Loot table for a chest type.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownChest`] when the type has no tier.
    pub fn tier(&self, chest_type: ChestType) -> Result<&ChestTier, CatalogError> {
        self.tiers
            .iter()
            .find(|t| t.chest_type == chest_type)
            .ok_or_else(|| CatalogError::UnknownChest(chest_type.to_string()))
    }
}

/// Fixed bundle produced when a chest is opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChestContents {
    pub chest_type: ChestType,
    pub coins: u64,
    pub xp: u64,
    pub gems: u64,
    pub equipment: Option<EquipmentDrop>,
}

fn draw_range<R: Rng + ?Sized>(range: [u64; 2], rng: &mut R) -> u64 {
    let [min, max] = range;
    if min >= max { min } else { rng.gen_range(min..=max) }
}

/// Roll the contents of one chest.
///
/// Coins and xp are uniform over the tier ranges. Gems and equipment are
/// independent rolls; equipment picks a weighted rarity, a random slot, then a
/// uniform item of that rarity in that slot.
pub fn generate_chest_contents<R: Rng + ?Sized>(
    tier: &ChestTier,
    equipment: &EquipmentCatalog,
    rng: &mut R,
) -> ChestContents {
    let coins = draw_range(tier.coins, rng);
    let xp = draw_range(tier.xp, rng);
    let gems = if rng.gen_bool(tier.gem_chance) {
        draw_range(tier.gems, rng)
    } else {
        0
    };
    let drop = if rng.gen_bool(tier.equipment_chance) {
        tier.pick_rarity(rng).and_then(|rarity| {
            let slot = if rng.gen_bool(0.5) {
                EquipmentSlot::Driver
            } else {
                EquipmentSlot::Ball
            };
            let pool: Vec<_> = equipment.items_of(rarity, slot).collect();
            if pool.is_empty() {
                return None;
            }
            let item = pool[rng.gen_range(0..pool.len())];
            Some(EquipmentDrop {
                id: item.id.clone(),
                slot,
                rarity,
            })
        })
    } else {
        None
    };
    log::debug!(
        "{} chest: {coins} coins, {xp} xp, {gems} gems, drop {:?}",
        tier.chest_type,
        drop.as_ref().map(|d| d.id.as_str())
    );
    ChestContents {
        chest_type: tier.chest_type,
        coins,
        xp,
        gems,
        equipment: drop,
    }
}

/// Earned chest. Contents are rolled on first open and never again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChestInstance {
    pub chest_type: ChestType,
    contents: Option<ChestContents>,
}

impl ChestInstance {
    #[must_use]
    pub const fn new(chest_type: ChestType) -> Self {
        Self {
            chest_type,
            contents: None,
        }
    }

    #[must_use]
    pub const fn is_opened(&self) -> bool {
        self.contents.is_some()
    }

    #[must_use]
    pub const fn contents(&self) -> Option<&ChestContents> {
        self.contents.as_ref()
    }

    /// Open the chest. A second call returns the stored contents unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if the chest type has no loot table.
    pub fn open<R: Rng + ?Sized>(
        &mut self,
        config: &ChestConfig,
        equipment: &EquipmentCatalog,
        rng: &mut R,
    ) -> Result<&ChestContents, CatalogError> {
        if self.contents.is_none() {
            let tier = config.tier(self.chest_type)?;
            self.contents = Some(generate_chest_contents(tier, equipment, rng));
        }
        self.contents
            .as_ref()
            .ok_or_else(|| CatalogError::UnknownChest(self.chest_type.to_string()))
    }
}
