//! Drawn normalized values, kept for replay.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::params::RandomizationParam;

/// Normalized draw for one parameter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SampleValue {
    Scalar(f32),
    Vector(Vec<f32>),
    /// Weakened leg and its normalized ratio.
    LegWeaken { leg: usize, ratio: f32 },
}

impl SampleValue {
    /// Number of normalized values.
    pub fn len(&self) -> usize {
        match self {
            Self::Scalar(_) | Self::LegWeaken { .. } => 1,
            Self::Vector(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Every parameter drawn in one randomization, ordered by name.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RandomizationSample {
    values: BTreeMap<RandomizationParam, SampleValue>,
}

impl RandomizationSample {
    pub const fn new() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, param: RandomizationParam, value: SampleValue) {
        self.values.insert(param, value);
    }

    pub fn get(&self, param: RandomizationParam) -> Option<&SampleValue> {
        self.values.get(&param)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (RandomizationParam, &SampleValue)> {
        self.values.iter().map(|(p, v)| (*p, v))
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

impl FromIterator<(RandomizationParam, SampleValue)> for RandomizationSample {
    fn from_iter<I: IntoIterator<Item = (RandomizationParam, SampleValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
