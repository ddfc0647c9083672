// Random sources used for exploration and tie-breaking
// The learner only needs uniform draws in [0, 1); everything else derives from that

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A source of uniform random draws
pub trait RandomSource {
    /// Draw a value uniformly from [0, 1)
    fn uniform(&mut self) -> f64;

    /// Draw an index uniformly from 0..len
    ///
    /// `len` must be non-zero.
    fn index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0, "index() called with an empty range");
        let scaled = (self.uniform() * len as f64) as usize;
        scaled.min(len.saturating_sub(1))
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn uniform(&mut self) -> f64 {
        (**self).uniform()
    }
}

impl<R: RandomSource + ?Sized> RandomSource for Box<R> {
    fn uniform(&mut self) -> f64 {
        (**self).uniform()
    }
}

/// Thread-local generator from `rand`
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn uniform(&mut self) -> f64 {
        rand::rng().random::<f64>()
    }
}

/// Reproducible generator seeded from a `u64`
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    /// Create a new seeded generator
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn uniform(&mut self) -> f64 {
        self.rng.random::<f64>()
    }
}

/// Replays a fixed list of draws, wrapping around at the end
#[derive(Debug, Clone)]
pub struct FixedSequence {
    draws: Vec<f64>,
    position: usize,
}

impl FixedSequence {
    /// Create a sequence from the given draws
    ///
    /// Values are clamped into [0, 1). An empty list behaves as a constant 0.0.
    pub fn new(draws: impl Into<Vec<f64>>) -> Self {
        let draws = draws
            .into()
            .into_iter()
            .map(|d| d.clamp(0.0, 1.0 - f64::EPSILON))
            .collect();
        Self { draws, position: 0 }
    }
}

impl RandomSource for FixedSequence {
    fn uniform(&mut self) -> f64 {
        if self.draws.is_empty() {
            return 0.0;
        }
        let value = self.draws[self.position % self.draws.len()];
        self.position = (self.position + 1) % self.draws.len();
        value
    }
}
