// Random number source for the lottery and simulated picks.
//
// The engine never calls `rand` directly; it draws through this trait so a
// run can be seeded for reproducibility or scripted for tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of uniform samples in `[0.0, 1.0)`.
pub trait RandomSource: Send {
    fn next_unit(&mut self) -> f64;
}

impl<R: RandomSource + ?Sized> RandomSource for Box<R> {
    fn next_unit(&mut self) -> f64 {
        (**self).next_unit()
    }
}

/// Production source backed by `rand::thread_rng()`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_unit(&mut self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Deterministic source for replaying a lottery from a known seed.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        SeededRandom {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Scripted source: returns the given values in order, cycling when
/// exhausted. Values are clamped into `[0.0, 1.0)`.
#[derive(Debug, Clone)]
pub struct FixedRandom {
    values: Vec<f64>,
    index: usize,
}

impl FixedRandom {
    pub fn new(values: Vec<f64>) -> Self {
        FixedRandom { values, index: 0 }
    }

    /// Always return the same value.
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }
}

impl RandomSource for FixedRandom {
    fn next_unit(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let value = self.values[self.index % self.values.len()];
        self.index += 1;
        value.clamp(0.0, 1.0 - f64::EPSILON)
    }
}
