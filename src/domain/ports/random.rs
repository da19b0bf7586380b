//! Injectable randomness seam.
//!
//! Thompson draws and baseline coin flips go through a `RandomSource`
//! so tests can substitute a seeded generator without touching any
//! global RNG state.

use std::sync::atomic::{AtomicU32, Ordering};

use rand::Rng;

/// A source of uniform random values in `[0, 1)`.
///
/// Implementations use interior mutability so a single source can be
/// shared behind an `Arc` across the selection and baseline paths.
pub trait RandomSource: Send + Sync {
    /// Draw one uniform value in `[0, 1)`.
    fn next_f64(&self) -> f64;
}

/// Default entropy source backed by the thread-local generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_f64(&self) -> f64 {
        rand::rng().random::<f64>()
    }
}

/// Linear-congruential generator with the classic Numerical Recipes
/// constants, for reproducible selection in tests and replay.
#[derive(Debug)]
pub struct SeededLcg {
    state: AtomicU32,
}

impl SeededLcg {
    /// Create a generator starting from `seed`.
    #[must_use]
    pub fn new(seed: u32) -> Self {
        Self {
            state: AtomicU32::new(seed),
        }
    }

    /// Advance an LCG state by one step: `s * 1664525 + 1013904223 mod 2^32`.
    #[must_use]
    pub fn step(state: u32) -> u32 {
        state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223)
    }
}

impl RandomSource for SeededLcg {
    fn next_f64(&self) -> f64 {
        let mut next = 0;
        let _ = self
            .state
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |s| {
                next = Self::step(s);
                Some(next)
            });
        f64::from(next) / f64::from(u32::MAX) / 1.000_000_1
    }
}
