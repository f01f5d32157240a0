use longdrive_game::{ProfileAggregate, ProfileDelta, ProfileStore};
use std::cell::RefCell;
use std::convert::Infallible;

/// In-process profile collaborator that applies every delta it receives.
#[derive(Debug, Default)]
pub struct MemoryStore {
    profile: RefCell<ProfileAggregate>,
    deltas: RefCell<Vec<ProfileDelta>>,
}

impl MemoryStore {
    #[must_use]
    pub fn with_profile(profile: ProfileAggregate) -> Self {
        Self {
            profile: RefCell::new(profile),
            deltas: RefCell::new(Vec::new()),
        }
    }

    /// A profile rich enough to buy every venue in the catalog.
    #[must_use]
    pub fn veteran() -> Self {
        Self::with_profile(ProfileAggregate {
            xp: 2_000_000,
            coins: 1_000_000,
            gems: 100_000,
            ..ProfileAggregate::default()
        })
    }

    #[must_use]
    pub fn snapshot(&self) -> ProfileAggregate {
        self.profile.borrow().clone()
    }

    #[must_use]
    pub fn delta_count(&self) -> usize {
        self.deltas.borrow().len()
    }
}

impl ProfileStore for MemoryStore {
    type Error = Infallible;

    fn load_profile(&self) -> Result<ProfileAggregate, Self::Error> {
        Ok(self.snapshot())
    }

    fn submit_delta(&self, delta: &ProfileDelta) -> Result<(), Self::Error> {
        self.profile.borrow_mut().apply(delta);
        self.deltas.borrow_mut().push(delta.clone());
        Ok(())
    }
}
