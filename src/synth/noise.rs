// White noise generator for snare, hi-hat and clap voices.
// Seeded from entropy: every hit sounds slightly different.

use super::oscillator::Oscillator;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone)]
pub struct NoiseGenerator {
    rng: StdRng,
}

impl NoiseGenerator {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible noise
    #[cfg(test)]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for NoiseGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Oscillator for NoiseGenerator {
    fn next_sample(&mut self) -> f32 {
        self.rng.gen_range(-1.0f32..=1.0)
    }

    fn reset(&mut self) {}
}
