//! Zero-mean Gaussian noise for scalar readings.
//!
//! Every sampling method takes an explicit `&mut R: Rng` parameter so that
//! determinism is guaranteed when the same seed is provided.

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// NoiseError
// ---------------------------------------------------------------------------

/// Validation errors for noise model parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NoiseError {
    /// Standard deviation was NaN or infinite.
    InvalidStdDev { value: f32 },
}

impl fmt::Display for NoiseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::InvalidStdDev { value } => {
                write!(f, "std_dev must be finite, got {value}")
            }
        }
    }
}

impl std::error::Error for NoiseError {}

// ---------------------------------------------------------------------------
// NoiseModel
// ---------------------------------------------------------------------------

/// Additive zero-mean Gaussian noise, `N(0, std²)`.
///
/// A zero `std` never touches the RNG, so a quiet channel reads back the
/// clean value and leaves the noise stream where it was.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NoiseModel {
    std: f32,
}

impl NoiseModel {
    /// Pass-through model.
    pub const fn none() -> Self {
        Self { std: 0.0 }
    }

    /// Gaussian from a configured stdev where values at or below zero mean
    /// "no noise".
    ///
    /// # Errors
    ///
    /// Returns [`NoiseError::InvalidStdDev`] if `stdev` is NaN or infinite.
    pub fn from_stdev(stdev: f32) -> Result<Self, NoiseError> {
        if !stdev.is_finite() {
            return Err(NoiseError::InvalidStdDev { value: stdev });
        }
        Ok(Self {
            std: stdev.max(0.0),
        })
    }

    pub const fn std(&self) -> f32 {
        self.std
    }

    /// Returns `true` if applying this model never changes a value.
    pub fn is_passthrough(&self) -> bool {
        self.std <= 0.0
    }

    /// Sample a single additive noise value.
    #[allow(clippy::cast_possible_truncation)]
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        if self.is_passthrough() {
            return 0.0;
        }
        Normal::new(0.0, f64::from(self.std)).map_or(0.0, |dist| dist.sample(rng) as f32)
    }

    /// Apply noise to every element of `values` in place.
    pub fn apply_slice<R: Rng + ?Sized>(&self, values: &mut [f32], rng: &mut R) {
        if self.is_passthrough() {
            return;
        }
        for v in values.iter_mut() {
            *v += self.sample(rng);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
