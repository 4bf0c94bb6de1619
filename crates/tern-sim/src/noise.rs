//! Seeded measurement noise.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Uniform noise source with a fixed seed, so runs are reproducible.
#[derive(Debug, Clone)]
pub struct NoiseGenerator {
    rng: StdRng,
}

impl NoiseGenerator {
    /// Creates a generator from `seed`.
    pub fn new(seed: u64) -> Self {
        NoiseGenerator {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// A sample from `[-amplitude, amplitude]`; exactly zero when the
    /// amplitude is not positive.
    pub fn uniform(&mut self, amplitude: f64) -> f64 {
        if amplitude > 0.0 {
            self.rng.random_range(-amplitude..=amplitude)
        } else {
            0.0
        }
    }
}
