//! Player profile snapshot, reward deltas and the persistence collaborator seam.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeSet;

use crate::equipment::{EquipmentCatalog, EquipmentSlot, Rarity};
use crate::error::CatalogError;
use crate::progression::ChestType;
use crate::venue::{Currency, VenueUnlock};

/// Equipment instance held by the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedEquipment {
    pub id: String,
    pub slot: EquipmentSlot,
    pub rarity: Rarity,
    /// Profile-tracked metadata only; it does not alter flight bonuses.
    pub level: u32,
    pub duplicates: u32,
}

/// Aggregate profile as last returned by the profile collaborator.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileAggregate {
    pub total_drives: u32,
    pub best_distance: f64,
    pub coins: u64,
    pub gems: u64,
    pub xp: u64,
    pub current_streak: u32,
    pub contest_wins: u32,
    pub unlocked_achievements: BTreeSet<String>,
    pub unlocked_venues: BTreeSet<String>,
    pub completed_challenges: BTreeSet<String>,
    /// Day index the `completed_daily` set belongs to.
    pub daily_day: u32,
    pub completed_daily: BTreeSet<String>,
    pub owned_equipment: Vec<OwnedEquipment>,
}

impl ProfileAggregate {
    #[must_use]
    pub fn owned(&self, id: &str) -> Option<&OwnedEquipment> {
        self.owned_equipment.iter().find(|item| item.id == id)
    }

    /// Highest rarity the player owns, if any.
    #[must_use]
    pub fn best_owned_rarity(&self) -> Option<Rarity> {
        self.owned_equipment.iter().map(|item| item.rarity).max()
    }

    /// Merge a reward delta into this snapshot.
    pub fn apply(&mut self, delta: &ProfileDelta) {
        self.total_drives = self.total_drives.saturating_add(delta.drives);
        self.xp = self.xp.saturating_add(delta.xp);
        self.coins = self.coins.saturating_add(delta.coins);
        self.gems = self.gems.saturating_add(delta.gems);
        self.contest_wins = self.contest_wins.saturating_add(delta.contest_wins);
        if let Some(best) = delta.best_distance
            && best > self.best_distance
        {
            self.best_distance = best;
        }
        if let Some(streak) = delta.streak {
            self.current_streak = streak;
        }
        for id in &delta.new_achievements {
            self.unlocked_achievements.insert(id.clone());
        }
        for id in &delta.new_challenges {
            self.completed_challenges.insert(id.clone());
        }
        if let Some(day) = delta.daily_day
            && day != self.daily_day
        {
            self.daily_day = day;
            self.completed_daily.clear();
        }
        for id in &delta.new_daily {
            self.completed_daily.insert(id.clone());
        }
        for drop in &delta.equipment_drops {
            self.grant_equipment(drop);
        }
        if let Some(unlock) = &delta.venue_unlock {
            self.apply_venue_unlock(unlock);
        }
    }

    /// Add an item, or bump its duplicate counter if already owned.
    pub fn grant_equipment(&mut self, drop: &EquipmentDrop) {
        if let Some(existing) = self
            .owned_equipment
            .iter_mut()
            .find(|item| item.id == drop.id)
        {
            existing.duplicates = existing.duplicates.saturating_add(1);
            return;
        }
        self.owned_equipment.push(OwnedEquipment {
            id: drop.id.clone(),
            slot: drop.slot,
            rarity: drop.rarity,
            level: 1,
            duplicates: 0,
        });
    }

    /// Spend duplicates to raise an item's level. Returns the new level, or
    /// `None` when the item is not owned or lacks duplicates.
    ///
    /// # Errors
    ///
    /// Returns an error if the owned id is missing from the catalog.
    pub fn upgrade_equipment(
        &mut self,
        id: &str,
        catalog: &EquipmentCatalog,
    ) -> Result<Option<u32>, CatalogError> {
        let Some(item) = self.owned_equipment.iter_mut().find(|item| item.id == id) else {
            return Ok(None);
        };
        let def = catalog.lookup(id, item.slot)?;
        if item.duplicates < def.dupes_to_upgrade {
            return Ok(None);
        }
        item.duplicates -= def.dupes_to_upgrade;
        item.level = item.level.saturating_add(1);
        log::info!("upgraded {id} to level {}", item.level);
        Ok(Some(item.level))
    }

    /// Deduct the cost and record the venue as unlocked.
    pub fn apply_venue_unlock(&mut self, unlock: &VenueUnlock) {
        match unlock.currency {
            Currency::Coins => self.coins = self.coins.saturating_sub(unlock.cost),
            Currency::Gems => self.gems = self.gems.saturating_sub(unlock.cost),
        }
        self.unlocked_venues.insert(unlock.venue_id.clone());
    }
}

/// Single equipment drop carried in a delta or a chest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentDrop {
    pub id: String,
    pub slot: EquipmentSlot,
    pub rarity: Rarity,
}

/// Everything a landed drive changed, for the collaborator to persist.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProfileDelta {
    pub drives: u32,
    pub xp: u64,
    pub coins: u64,
    pub gems: u64,
    pub contest_wins: u32,
    pub best_distance: Option<f64>,
    pub streak: Option<u32>,
    pub equipment_drops: Vec<EquipmentDrop>,
    pub new_achievements: SmallVec<[String; 4]>,
    pub new_challenges: SmallVec<[String; 2]>,
    pub daily_day: Option<u32>,
    pub new_daily: SmallVec<[String; 2]>,
    pub chests_earned: SmallVec<[ChestType; 2]>,
    pub venue_unlock: Option<VenueUnlock>,
}

impl ProfileDelta {
    /// Whether anything beyond the drive counter changed.
    #[must_use]
    pub fn has_unlocks(&self) -> bool {
        !self.new_achievements.is_empty()
            || !self.new_challenges.is_empty()
            || !self.new_daily.is_empty()
    }
}

/// Trait for abstracting profile persistence.
/// Platform-specific implementations should provide this
pub trait ProfileStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the current profile snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile cannot be read.
    fn load_profile(&self) -> Result<ProfileAggregate, Self::Error>;

    /// Persist a reward delta. Fire-and-forget from the engine's point of view.
    ///
    /// # Errors
    ///
    /// Returns an error if the delta cannot be stored.
    fn submit_delta(&self, delta: &ProfileDelta) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drop_of(id: &str, rarity: Rarity) -> EquipmentDrop {
        EquipmentDrop {
            id: id.to_string(),
            slot: EquipmentSlot::Driver,
            rarity,
        }
    }

    #[test]
    fn duplicates_accumulate_and_upgrade_consumes_them() {
        let catalog = EquipmentCatalog::default_config().unwrap();
        let def = catalog.lookup("club_pro", EquipmentSlot::Driver).unwrap();
        let needed = def.dupes_to_upgrade;
        let mut profile = ProfileAggregate::default();
        let drop = drop_of("club_pro", def.rarity);
        for _ in 0..=needed {
            profile.grant_equipment(&drop);
        }
        assert_eq!(profile.owned("club_pro").unwrap().duplicates, needed);
        assert_eq!(
            profile.upgrade_equipment("club_pro", &catalog).unwrap(),
            Some(2)
        );
        let owned = profile.owned("club_pro").unwrap();
        assert_eq!(owned.duplicates, 0);
        assert_eq!(owned.level, 2);
        assert_eq!(profile.upgrade_equipment("club_pro", &catalog).unwrap(), None);
        assert_eq!(profile.upgrade_equipment("missing", &catalog).unwrap(), None);
    }

    #[test]
    fn apply_merges_counters_and_sets() {
        let mut profile = ProfileAggregate {
            best_distance: 250.0,
            ..ProfileAggregate::default()
        };
        let mut delta = ProfileDelta {
            drives: 1,
            xp: 40,
            coins: 12,
            best_distance: Some(240.0),
            streak: Some(3),
            ..ProfileDelta::default()
        };
        delta.new_achievements.push("first_drive".into());
        profile.apply(&delta);
        assert_eq!(profile.total_drives, 1);
        assert_eq!(profile.xp, 40);
        assert_eq!(profile.current_streak, 3);
        assert!((profile.best_distance - 250.0).abs() < f64::EPSILON);
        assert!(profile.unlocked_achievements.contains("first_drive"));
    }

    #[test]
    fn new_daily_index_resets_completed_set() {
        let mut profile = ProfileAggregate::default();
        profile.completed_daily.insert("daily_260".into());
        let mut delta = ProfileDelta {
            daily_day: Some(5),
            ..ProfileDelta::default()
        };
        delta.new_daily.push("daily_300".into());
        profile.apply(&delta);
        assert_eq!(profile.daily_day, 5);
        assert_eq!(profile.completed_daily.len(), 1);
        assert!(profile.completed_daily.contains("daily_300"));
    }

    #[test]
    fn best_owned_rarity_tracks_maximum() {
        let mut profile = ProfileAggregate::default();
        assert_eq!(profile.best_owned_rarity(), None);
        profile.grant_equipment(&drop_of("starter_driver", Rarity::Common));
        profile.grant_equipment(&drop_of("titan_head", Rarity::Epic));
        assert_eq!(profile.best_owned_rarity(), Some(Rarity::Epic));
    }
}
