//! Deterministic random number generation.
//!
//! RULE: Nothing in instance generation may call any platform RNG.
//! All randomness flows through ExchangeRng instances derived
//! from the single master seed of a conversion run.
//!
//! Each generated instance gets its own RNG stream, seeded deterministically
//! from (master_seed XOR stream_index). This means:
//!   - Generating more instances never changes earlier instances' streams.
//!   - Each instance is fully reproducible in isolation.

use rand::distributions::Distribution;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;

/// A deterministic RNG for a single instance build.
pub struct ExchangeRng {
    pub stream: u64,
    inner: Pcg64Mcg,
}

impl ExchangeRng {
    /// Create a stream from the master seed and a stable stream index.
    pub fn new(master_seed: u64, stream: u64) -> Self {
        let derived_seed = master_seed ^ (stream.wrapping_mul(0x9e37_79b9_7f4a_7c15));
        Self {
            stream,
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    /// Shorthand for tests and one-off builds.
    pub fn seeded(seed: u64) -> Self {
        Self::new(seed, 0)
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        self.inner.gen::<f64>()
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        assert!(n > 0, "n must be > 0");
        self.inner.gen_range(0..n)
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Draw from any `f64` distribution.
    pub fn sample<D: Distribution<f64>>(&mut self, dist: &D) -> f64 {
        dist.sample(&mut self.inner)
    }

    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.inner);
    }

    /// Pick one element uniformly. `None` on an empty slice.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        items.choose(&mut self.inner)
    }

    /// Draw `n` distinct elements without replacement.
    /// Returns `None` when the pool holds fewer than `n` elements.
    pub fn sample_distinct<T: Clone>(&mut self, pool: &[T], n: usize) -> Option<Vec<T>> {
        if n > pool.len() {
            return None;
        }
        Some(pool.choose_multiple(&mut self.inner, n).cloned().collect())
    }
}

/// All instance RNG streams for a single conversion run.
pub struct RngBank {
    master_seed: u64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// The stream for a stable index. Indices must never be reassigned.
    pub fn stream(&self, index: u64) -> ExchangeRng {
        ExchangeRng::new(self.master_seed, index)
    }
}
