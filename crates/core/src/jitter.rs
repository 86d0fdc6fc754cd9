//! Random sources for the `current` fluctuation term.
//!
//! The derivation rules add a uniform jitter in `[-1, 1]` to the derived
//! current. The source is injected so tests can pin it.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Produces jitter samples in `[-1.0, 1.0]`.
pub trait JitterSource: Send + Sync {
    fn sample(&self) -> f64;
}

/// Thread-local RNG. Used in production.
#[derive(Debug, Default)]
pub struct ThreadJitter;

impl JitterSource for ThreadJitter {
    fn sample(&self) -> f64 {
        rand::rng().random_range(-1.0..=1.0)
    }
}

/// Deterministic RNG seeded at construction; repeatable across runs.
#[derive(Debug)]
pub struct SeededJitter {
    rng: Mutex<StdRng>,
}

impl SeededJitter {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl JitterSource for SeededJitter {
    fn sample(&self) -> f64 {
        match self.rng.lock() {
            Ok(mut rng) => rng.random_range(-1.0..=1.0),
            // A poisoned lock still holds a usable RNG state.
            Err(poisoned) => poisoned.into_inner().random_range(-1.0..=1.0),
        }
    }
}

/// Always returns the same value (clamped into `[-1, 1]`).
#[derive(Debug, Clone, Copy)]
pub struct FixedJitter(pub f64);

impl JitterSource for FixedJitter {
    fn sample(&self) -> f64 {
        self.0.clamp(-1.0, 1.0)
    }
}
