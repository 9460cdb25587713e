use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of the bounded uniform draws used for model noise.
///
/// Production uses [`StdRandom`]; tests inject [`ConstantRandom`] to pin
/// every draw and assert exact values.
#[cfg_attr(test, mockall::automock)]
pub trait RandomSource {
    /// Draw from `[low, high]`.
    fn uniform(&mut self, low: f64, high: f64) -> f64;
}

pub struct StdRandom {
    rng: StdRng,
}

impl StdRandom {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_seed_option(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_entropy(),
        }
    }
}

impl RandomSource for StdRandom {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if !(low < high) {
            return low;
        }
        self.rng.gen_range(low..=high)
    }
}

/// Returns the same relative position inside every requested range.
#[derive(Debug, Clone, Copy)]
pub struct ConstantRandom {
    fraction: f64,
}

impl ConstantRandom {
    pub fn new(fraction: f64) -> Self {
        Self {
            fraction: fraction.clamp(0.0, 1.0),
        }
    }

    /// Every draw lands on the range midpoint, so symmetric noise is zero.
    pub fn midpoint() -> Self {
        Self::new(0.5)
    }
}

impl RandomSource for ConstantRandom {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.fraction
    }
}
