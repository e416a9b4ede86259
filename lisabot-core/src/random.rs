// File: lisabot-core/src/random.rs
//
// Every coin flip the bot makes goes through `RandomSource`, so tests can script them.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub trait RandomSource: Send + Sync {
    /// Uniform draw from `1..=upper`.
    fn roll(&mut self, upper: u32) -> u32;

    /// Uniform index into a collection of `len` items. `len` must be non-zero.
    fn pick(&mut self, len: usize) -> usize;

    /// True on a 1-in-`odds` draw.
    fn one_in(&mut self, odds: u32) -> bool {
        self.roll(odds) == 1
    }
}

/// Backed by the thread-local generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn roll(&mut self, upper: u32) -> u32 {
        rand::rng().random_range(1..=upper.max(1))
    }

    fn pick(&mut self, len: usize) -> usize {
        rand::rng().random_range(0..len.max(1))
    }
}

/// Reproducible draws from a fixed seed.
#[derive(Debug, Clone)]
pub struct SeededRandom(StdRng);

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl RandomSource for SeededRandom {
    fn roll(&mut self, upper: u32) -> u32 {
        self.0.random_range(1..=upper.max(1))
    }

    fn pick(&mut self, len: usize) -> usize {
        self.0.random_range(0..len.max(1))
    }
}
