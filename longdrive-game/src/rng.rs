use hmac::{Hmac, Mac};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use sha2::{Digest, Sha256};
use std::cell::{RefCell, RefMut};

type HmacSha256 = Hmac<Sha256>;

/// Deterministic bundle of RNG streams segregated by engine domain.
///
/// Each stream is derived from one user-visible seed, so adding draws to one
/// domain never shifts the sequence another domain sees.
#[derive(Debug, Clone)]
pub struct RngBundle {
    seed: u64,
    flight: RefCell<CountingRng<SmallRng>>,
    weather: RefCell<CountingRng<SmallRng>>,
    opponent: RefCell<CountingRng<SmallRng>>,
    loot: RefCell<CountingRng<SmallRng>>,
}

impl RngBundle {
    /// Construct the bundle from a user-visible seed.
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self {
            seed,
            flight: RefCell::new(CountingRng::new(derive_stream_seed(seed, b"flight"))),
            weather: RefCell::new(CountingRng::new(derive_stream_seed(seed, b"weather"))),
            opponent: RefCell::new(CountingRng::new(derive_stream_seed(seed, b"opponent"))),
            loot: RefCell::new(CountingRng::new(derive_stream_seed(seed, b"loot"))),
        }
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Roll-factor draws.
    #[must_use]
    pub fn flight(&self) -> RefMut<'_, CountingRng<SmallRng>> {
        self.flight.borrow_mut()
    }

    /// Weather pick and wind draws.
    #[must_use]
    pub fn weather(&self) -> RefMut<'_, CountingRng<SmallRng>> {
        self.weather.borrow_mut()
    }

    /// Opponent selection and simulated opponent drives.
    #[must_use]
    pub fn opponent(&self) -> RefMut<'_, CountingRng<SmallRng>> {
        self.opponent.borrow_mut()
    }

    /// Chest contents.
    #[must_use]
    pub fn loot(&self) -> RefMut<'_, CountingRng<SmallRng>> {
        self.loot.borrow_mut()
    }

    /// Draw counts per stream, in `flight, weather, opponent, loot` order.
    #[must_use]
    pub fn draw_counts(&self) -> [u64; 4] {
        [
            self.flight.borrow().draws(),
            self.weather.borrow().draws(),
            self.opponent.borrow().draws(),
            self.loot.borrow().draws(),
        ]
    }
}

/// Counting wrapper for RNG streams providing instrumentation.
#[derive(Debug, Clone)]
pub struct CountingRng<R> {
    rng: R,
    draws: u64,
}

impl CountingRng<SmallRng> {
    fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            draws: 0,
        }
    }
}

impl<R: rand::RngCore> CountingRng<R> {
    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl<R: rand::RngCore> rand::RngCore for CountingRng<R> {
    fn next_u32(&mut self) -> u32 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.draws = self.draws.saturating_add(1);
        self.rng.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.draws = self.draws.saturating_add(1);
        self.rng.try_fill_bytes(dest)
    }
}

fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    // HMAC accepts keys of any length, the plain digest branch is never taken in practice.
    let digest = match HmacSha256::new_from_slice(&user_seed.to_le_bytes()) {
        Ok(mut mac) => {
            mac.update(domain_tag);
            mac.finalize().into_bytes()
        }
        Err(_) => Sha256::new()
            .chain_update(user_seed.to_le_bytes())
            .chain_update(domain_tag)
            .finalize(),
    };
    let mut seed_bytes = [0_u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}
