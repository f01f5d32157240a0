//! Long-Drive Contest Engine
//!
//! Platform-agnostic core for the long-drive contest: ball-flight simulation,
//! shot and contest state machines, and the progression economy.
//! This crate has no rendering, input or persistence dependencies.

pub mod catalog;
pub mod constants;
pub mod contest;
pub mod equipment;
pub mod error;
pub mod history;
pub mod numbers;
pub mod oscillator;
pub mod profile;
pub mod progression;
pub mod result;
pub mod rng;
pub mod session;
pub mod shot;
pub mod trajectory;
pub mod venue;
pub mod weather;

// Re-export commonly used types
pub use catalog::{CatalogLoader, Catalogs, EmbeddedCatalogs};
pub use contest::{
    AiDrive, ContestAction, ContestOrchestrator, ContestResult, ContestRound, ContestState,
    ContestUpdate, Opponent, OpponentCatalog, simulate_ai_drive,
};
pub use equipment::{BonusSet, EquipmentCatalog, EquipmentDef, EquipmentSlot, Loadout, Rarity};
pub use error::{CatalogError, ContestError, SessionError, ShotError, SimulationError};
pub use history::DriveHistory;
pub use oscillator::Oscillator;
pub use profile::{EquipmentDrop, OwnedEquipment, ProfileAggregate, ProfileDelta, ProfileStore};
pub use progression::{
    AchievementCatalog, AchievementContext, ChallengeCatalog, ChestConfig, ChestContents,
    ChestInstance, ChestType, Division, DivisionTable, DriveContext, LevelProgress,
    check_achievements, check_challenge, generate_chest_contents, level_from_xp, xp_for_level,
};
pub use result::DriveResult;
pub use rng::RngBundle;
pub use session::{GameSession, PlayMode, SessionEvent, SessionEvents};
pub use shot::{ShotEvent, ShotMachine, ShotPhase, ShotSetup};
pub use trajectory::{DriveParams, FlightPoint, Trajectory, simulate_drive};
pub use venue::{Currency, VenueCatalog, VenueDef, VenueLockReason, VenueUnlock};
pub use weather::{AmbientConditions, WeatherCatalog, WeatherCondition};

/// Main engine for building game sessions
pub struct LongDriveEngine<L, S>
where
    L: CatalogLoader,
    S: ProfileStore,
{
    loader: L,
    store: S,
    catalogs: Catalogs,
}

impl<L, S> LongDriveEngine<L, S>
where
    L: CatalogLoader,
    S: ProfileStore,
{
    /// Load and validate catalogs once; they are shared by every session.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalogs cannot be loaded.
    pub fn new(loader: L, store: S) -> Result<Self, L::Error> {
        let catalogs = loader.load_catalogs()?;
        Ok(Self {
            loader,
            store,
            catalogs,
        })
    }

    #[must_use]
    pub const fn catalogs(&self) -> &Catalogs {
        &self.catalogs
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Re-read catalogs from the loader, e.g. after a content update.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalogs cannot be loaded.
    pub fn reload_catalogs(&mut self) -> Result<(), L::Error> {
        self.catalogs = self.loader.load_catalogs()?;
        Ok(())
    }

    /// Create a session from the stored profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile cannot be loaded.
    pub fn create_session(&self, seed: u64) -> Result<GameSession<'_, S>, anyhow::Error>
    where
        S::Error: Into<anyhow::Error>,
    {
        let profile = self.store.load_profile().map_err(Into::into)?;
        log::debug!(
            "session seed {seed}: level {} with {} drives",
            level_from_xp(profile.xp).level,
            profile.total_drives
        );
        Ok(GameSession::new(&self.catalogs, &self.store, profile, seed))
    }

    /// Create a session that starts from a fresh profile when the store is unreachable.
    #[must_use]
    pub fn create_offline_session(&self, seed: u64) -> GameSession<'_, S> {
        let profile = self.store.load_profile().unwrap_or_else(|err| {
            log::warn!("profile store unavailable, starting fresh: {err}");
            ProfileAggregate::default()
        });
        GameSession::new(&self.catalogs, &self.store, profile, seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::convert::Infallible;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct MemoryStore {
        profile: Rc<RefCell<ProfileAggregate>>,
        submitted: Rc<RefCell<usize>>,
    }

    impl ProfileStore for MemoryStore {
        type Error = Infallible;

        fn load_profile(&self) -> Result<ProfileAggregate, Self::Error> {
            Ok(self.profile.borrow().clone())
        }

        fn submit_delta(&self, delta: &ProfileDelta) -> Result<(), Self::Error> {
            self.profile.borrow_mut().apply(delta);
            *self.submitted.borrow_mut() += 1;
            Ok(())
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("catalog service down")]
    struct LoaderDown;

    struct FailingLoader;

    impl CatalogLoader for FailingLoader {
        type Error = LoaderDown;

        fn load_catalogs(&self) -> Result<Catalogs, Self::Error> {
            Err(LoaderDown)
        }
    }

    #[test]
    fn engine_builds_sessions_from_stored_profile() {
        let store = MemoryStore::default();
        store.profile.borrow_mut().xp = 10_000;
        let engine = LongDriveEngine::new(EmbeddedCatalogs, store.clone()).unwrap();
        let session = engine.create_session(9).unwrap();
        assert_eq!(session.profile().xp, 10_000);
        assert_eq!(session.venue().unwrap().id, "driving_range");
        assert_eq!(session.phase(), ShotPhase::Idle);
    }

    #[test]
    fn session_deltas_flow_back_to_store() {
        let store = MemoryStore::default();
        let engine = LongDriveEngine::new(EmbeddedCatalogs, store.clone()).unwrap();
        let mut session = engine.create_session(5).unwrap();
        session.start_charge().unwrap();
        session.advance(0.5).unwrap();
        session.lock_current_phase().unwrap();
        session.advance(0.3).unwrap();
        session.lock_current_phase().unwrap();
        while session.phase() != ShotPhase::Landed {
            session.advance(1.0 / 60.0).unwrap();
        }
        assert_eq!(*store.submitted.borrow(), 1);
        assert_eq!(store.profile.borrow().total_drives, 1);
        assert_eq!(session.profile(), &*store.profile.borrow());
    }

    #[test]
    fn loader_failure_surfaces_at_startup() {
        assert!(LongDriveEngine::new(FailingLoader, MemoryStore::default()).is_err());
    }
}
