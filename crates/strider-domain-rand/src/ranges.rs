//! Parameter ranges and the normalized-to-physical transform.
//!
//! Samples are drawn uniformly in [`ParamBounds`] (default `[-1, 1]`) and
//! mapped linearly onto a [`ParamRange`]. The end points map exactly: the
//! lower bound yields `low` and the upper bound yields `high`.

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from constructing a range.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum RangeError {
    #[error("invalid bounds: low ({low}) > high ({high})")]
    InvalidBounds { low: f32, high: f32 },

    #[error("invalid rejection range: low ({low}) > high ({high})")]
    InvalidRejection { low: f32, high: f32 },

    #[error("sample bounds must satisfy low < high: low={low}, high={high}")]
    EmptySampleBounds { low: f32, high: f32 },

    #[error("value is not finite: {0}")]
    NonFinite(f32),

    #[error("a range has 2 or 4 values, got {0}")]
    WrongArity(usize),
}

fn check_finite(values: &[f32]) -> Result<(), RangeError> {
    match values.iter().find(|v| !v.is_finite()) {
        Some(&v) => Err(RangeError::NonFinite(v)),
        None => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// ParamBounds
// ---------------------------------------------------------------------------

/// Interval normalized samples are drawn from.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f32; 2]", into = "[f32; 2]")]
pub struct ParamBounds {
    low: f32,
    high: f32,
}

impl ParamBounds {
    pub fn new(low: f32, high: f32) -> Result<Self, RangeError> {
        check_finite(&[low, high])?;
        if low >= high {
            return Err(RangeError::EmptySampleBounds { low, high });
        }
        Ok(Self { low, high })
    }

    pub const fn low(&self) -> f32 {
        self.low
    }

    pub const fn high(&self) -> f32 {
        self.high
    }

    /// Uniform draw in `[low, high)`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        rng.gen_range(self.low..self.high)
    }

    /// `count` independent draws.
    pub fn sample_n<R: Rng + ?Sized>(&self, rng: &mut R, count: usize) -> Vec<f32> {
        (0..count).map(|_| self.sample(rng)).collect()
    }

    /// Position of `sample` within the bounds, 0 at `low` and 1 at `high`.
    fn fraction(&self, sample: f32) -> f32 {
        (sample - self.low) / (self.high - self.low)
    }
}

impl Default for ParamBounds {
    fn default() -> Self {
        Self {
            low: -1.0,
            high: 1.0,
        }
    }
}

impl TryFrom<[f32; 2]> for ParamBounds {
    type Error = RangeError;

    fn try_from([low, high]: [f32; 2]) -> Result<Self, Self::Error> {
        Self::new(low, high)
    }
}

impl From<ParamBounds> for [f32; 2] {
    fn from(b: ParamBounds) -> Self {
        [b.low, b.high]
    }
}

// ---------------------------------------------------------------------------
// ParamRange
// ---------------------------------------------------------------------------

/// Physical target range of one parameter, optionally with a forbidden
/// sub-range that triggers re-sampling.
///
/// Serialized as `[low, high]` or `[low, high, reject_low, reject_high]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f32>", into = "Vec<f32>")]
pub struct ParamRange {
    low: f32,
    high: f32,
    reject: Option<(f32, f32)>,
}

impl ParamRange {
    pub fn new(low: f32, high: f32) -> Result<Self, RangeError> {
        check_finite(&[low, high])?;
        if low > high {
            return Err(RangeError::InvalidBounds { low, high });
        }
        Ok(Self {
            low,
            high,
            reject: None,
        })
    }

    /// Range from literal bounds already known to satisfy `low <= high`.
    pub(crate) const fn new_unchecked(low: f32, high: f32) -> Self {
        Self {
            low,
            high,
            reject: None,
        }
    }

    /// Add a forbidden sub-range `[low, high]`.
    pub fn with_rejection(mut self, low: f32, high: f32) -> Result<Self, RangeError> {
        check_finite(&[low, high])?;
        if low > high {
            return Err(RangeError::InvalidRejection { low, high });
        }
        self.reject = Some((low, high));
        Ok(self)
    }

    pub const fn low(&self) -> f32 {
        self.low
    }

    pub const fn high(&self) -> f32 {
        self.high
    }

    pub const fn rejection(&self) -> Option<(f32, f32)> {
        self.reject
    }

    /// Map a normalized sample onto this range.
    pub fn transform(&self, sample: f32, bounds: ParamBounds) -> f32 {
        let t = bounds.fraction(sample);
        self.high.mul_add(t, self.low * (1.0 - t))
    }

    /// Map every sample onto this range.
    pub fn transform_all(&self, samples: &[f32], bounds: ParamBounds) -> Vec<f32> {
        samples.iter().map(|&s| self.transform(s, bounds)).collect()
    }

    /// True when every value lies inside the forbidden sub-range.
    ///
    /// Always false without one.
    pub fn rejects(&self, physical: &[f32]) -> bool {
        match self.reject {
            Some((low, high)) => physical.iter().all(|v| (low..=high).contains(v)),
            None => false,
        }
    }
}

impl TryFrom<Vec<f32>> for ParamRange {
    type Error = RangeError;

    fn try_from(values: Vec<f32>) -> Result<Self, Self::Error> {
        match values.as_slice() {
            &[low, high] => Self::new(low, high),
            &[low, high, reject_low, reject_high] => {
                Self::new(low, high)?.with_rejection(reject_low, reject_high)
            }
            other => Err(RangeError::WrongArity(other.len())),
        }
    }
}

impl From<ParamRange> for Vec<f32> {
    fn from(r: ParamRange) -> Self {
        match r.reject {
            Some((rl, rh)) => vec![r.low, r.high, rl, rh],
            None => vec![r.low, r.high],
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
