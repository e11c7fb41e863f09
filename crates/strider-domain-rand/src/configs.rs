//! Randomization specs: which parameters to perturb and over what range.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use strider_core::ConfigError;

use crate::params::{RandomizationParam, action_repeat_for};
use crate::ranges::ParamRange;

/// Parameter ranges of one randomization setup, ordered by name.
///
/// In TOML, one key per parameter:
///
/// ```toml
/// mass = [0.8, 1.2]
/// "motor strength" = [0.8, 1.0]
/// battery = [14.0, 16.8, 14.0, 14.5]  # re-sample while in [14.0, 14.5]
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RandomizationSpec {
    ranges: BTreeMap<RandomizationParam, ParamRange>,
}

impl RandomizationSpec {
    pub const fn new() -> Self {
        Self {
            ranges: BTreeMap::new(),
        }
    }

    /// Builder: add or replace one parameter.
    #[must_use]
    pub fn with(mut self, param: RandomizationParam, range: ParamRange) -> Self {
        self.ranges.insert(param, range);
        self
    }

    pub fn insert(&mut self, param: RandomizationParam, range: ParamRange) {
        self.ranges.insert(param, range);
    }

    pub fn get(&self, param: RandomizationParam) -> Option<&ParamRange> {
        self.ranges.get(&param)
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (RandomizationParam, &ParamRange)> {
        self.ranges.iter().map(|(p, r)| (*p, r))
    }

    /// True when any parameter carries a forbidden sub-range.
    pub fn has_rejection(&self) -> bool {
        self.ranges.values().any(|r| r.rejection().is_some())
    }

    /// Largest action repeat a `control step` draw can produce, if that
    /// parameter is randomized.
    pub fn max_action_repeat(&self) -> Option<usize> {
        self.get(RandomizationParam::ControlStep)
            .map(|r| action_repeat_for(r.low().max(r.high())))
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Look up a built-in spec by name.
    pub fn by_name(name: &str) -> Result<Self, ConfigError> {
        match name {
            "all_params" => Ok(all_params()),
            "mass_and_inertia" => Ok(mass_and_inertia()),
            "actuator_params" => Ok(actuator_params()),
            "leg_weakening" => Ok(leg_weakening()),
            "no_params" => Ok(Self::new()),
            other => Err(ConfigError::UnknownRandomizationSpec(other.to_owned())),
        }
    }
}

/// Names accepted by [`RandomizationSpec::by_name`].
pub const SPEC_NAMES: [&str; 5] = [
    "all_params",
    "mass_and_inertia",
    "actuator_params",
    "leg_weakening",
    "no_params",
];

const fn range(low: f32, high: f32) -> ParamRange {
    ParamRange::new_unchecked(low, high)
}

/// Ratios for mass, inertia and strength; SI units for the rest.
pub fn all_params() -> RandomizationSpec {
    RandomizationSpec::new()
        .with(RandomizationParam::Mass, range(0.8, 1.2))
        .with(RandomizationParam::Inertia, range(0.5, 1.5))
        .with(RandomizationParam::MotorStrength, range(0.8, 1.0))
        .with(RandomizationParam::MotorFriction, range(0.0, 0.05))
        .with(RandomizationParam::Latency, range(0.0, 0.04))
        .with(RandomizationParam::LateralFriction, range(0.5, 1.25))
        .with(RandomizationParam::Battery, range(14.0, 16.8))
        .with(RandomizationParam::JointFriction, range(0.0, 0.05))
}

/// Per-link mass and inertia ratios.
pub fn mass_and_inertia() -> RandomizationSpec {
    RandomizationSpec::new()
        .with(RandomizationParam::IndividualMass, range(0.8, 1.2))
        .with(RandomizationParam::IndividualInertia, range(0.5, 1.5))
}

/// Actuator-side parameters only.
pub fn actuator_params() -> RandomizationSpec {
    RandomizationSpec::new()
        .with(RandomizationParam::GlobalMotorStrength, range(0.8, 1.0))
        .with(RandomizationParam::MotorFriction, range(0.0, 0.05))
        .with(RandomizationParam::Battery, range(14.0, 16.8))
        .with(RandomizationParam::Latency, range(0.0, 0.04))
}

/// One random leg weakened to between 50% and 100% strength.
pub fn leg_weakening() -> RandomizationSpec {
    RandomizationSpec::new().with(RandomizationParam::LegWeaken, range(0.5, 1.0))
}
