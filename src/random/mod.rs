//! Random streams for the engine. Every sample owns exactly one [`SimRng`], seeded from the
//! base seed plus a deterministic hash of the sample index, so any sample can be replayed on
//! its own.
mod sampling_algorithms;

pub use sampling_algorithms::{sample_from_slice, sample_from_stream, Reservoir};

use log::trace;
use rand_distr::{Distribution, Poisson};

use crate::hashing::hash_usize;
use crate::rand::rngs::SmallRng;
use crate::rand::seq::index::sample as choose_range;
use crate::rand::{Rng, SeedableRng};

/// The single random stream of one sample.
#[derive(Debug, Clone)]
pub struct SimRng {
    rng: SmallRng,
}

impl SimRng {
    /// The stream for `sample` under `base_seed`.
    pub fn for_sample(base_seed: u64, sample: usize) -> Self {
        let seed = base_seed.wrapping_add(hash_usize(sample));
        trace!("creating new RNG (base_seed={base_seed}) for sample {sample}");
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// A uniform draw in `[0, 1)`.
    pub fn uniform(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    /// True when a fresh uniform draw falls below `p`.
    pub fn chance(&mut self, p: f64) -> bool {
        self.uniform() < p
    }

    /// A Poisson draw with the given mean. A mean of zero (or below) always yields zero.
    pub fn poisson(&mut self, mean: f64) -> usize {
        if mean.is_nan() || mean <= 0.0 {
            return 0;
        }
        match Poisson::new(mean) {
            Ok(distribution) => distribution.sample(&mut self.rng) as usize,
            Err(_) => 0,
        }
    }

    /// A uniformly chosen subset of `0..len` with `min(amount, len)` distinct members, in
    /// draw order.
    pub fn subset_indices(&mut self, len: usize, amount: usize) -> Vec<usize> {
        let amount = amount.min(len);
        if amount == 0 {
            return Vec::new();
        }
        choose_range(&mut self.rng, len, amount).into_vec()
    }

    /// Chooses `min(requested, len)` items of a slice without replacement, in slice order.
    pub fn choose_from<T: Copy>(&mut self, items: &[T], requested: usize) -> Vec<T> {
        sample_from_slice(&mut self.rng, items, requested)
    }

    /// Chooses up to `requested` items from an iterator of unknown length.
    pub fn choose_from_iter<T, I>(&mut self, iter: I, requested: usize) -> Vec<T>
    where
        I: IntoIterator<Item = T>,
    {
        sample_from_stream(&mut self.rng, iter, requested)
    }
}
