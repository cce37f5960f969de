//! Per-retrier seed counter
//!
//! Every execution draws its jitter from a private generator seeded with a
//! distinct counter value, so concurrent executions sharing one retrier never
//! replay the same random stream.

use std::sync::{Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Monotonically incrementing seed guarded by a mutex
#[derive(Debug)]
pub struct SeedSequence {
    next: Mutex<u64>,
}

impl SeedSequence {
    /// Start the sequence at the current wall-clock time in nanoseconds.
    pub fn from_clock() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos() as u64)
            .unwrap_or_default();
        Self::starting_at(nanos)
    }

    /// Start the sequence at a fixed value.
    pub fn starting_at(seed: u64) -> Self {
        Self { next: Mutex::new(seed) }
    }

    /// Increment the counter and return the new value.
    pub fn advance(&self) -> u64 {
        let mut seed = self.lock();
        *seed = seed.wrapping_add(1);
        *seed
    }

    /// Seed a fresh generator from the next counter value.
    pub fn rng(&self) -> StdRng {
        StdRng::seed_from_u64(self.advance())
    }

    fn lock(&self) -> MutexGuard<'_, u64> {
        match self.next.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
