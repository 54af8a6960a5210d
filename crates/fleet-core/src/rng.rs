//! Deterministic simulation-level RNG.
//!
//! The restriction engine itself never draws random numbers.  Randomness
//! enters only through [`RngResolver`][crate::RngResolver] when a scenario
//! file declares ranged or discrete parameters, and through whatever a
//! caller-supplied policy does.  Both are seeded from one `SimRng` so that
//! the same seed always yields the same episode.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Seeded RNG for parameter resolution and other global draws.
///
/// Used only from the single simulation thread.
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }

    /// Choose a random element from a slice.  `None` if the slice is empty.
    #[inline]
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        use rand::seq::SliceRandom;
        slice.choose(&mut self.0)
    }
}
