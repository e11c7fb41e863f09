//! Per-channel noise for robot readings.
//!
//! A robot reports five kinds of value. Each has its own [`NoiseModel`],
//! applied element-wise to every value of that kind.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::model::{NoiseError, NoiseModel};

/// Kind of robot reading a noise model applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseChannel {
    MotorAngle,
    MotorVelocity,
    MotorTorque,
    RollPitchYaw,
    RollPitchYawRate,
}

impl NoiseChannel {
    pub const ALL: [Self; 5] = [
        Self::MotorAngle,
        Self::MotorVelocity,
        Self::MotorTorque,
        Self::RollPitchYaw,
        Self::RollPitchYawRate,
    ];

    const fn index(self) -> usize {
        match self {
            Self::MotorAngle => 0,
            Self::MotorVelocity => 1,
            Self::MotorTorque => 2,
            Self::RollPitchYaw => 3,
            Self::RollPitchYawRate => 4,
        }
    }
}

/// One [`NoiseModel`] per [`NoiseChannel`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObservationNoise {
    models: [NoiseModel; 5],
}

impl ObservationNoise {
    /// No noise on any channel.
    pub fn none() -> Self {
        Self::default()
    }

    /// Zero-mean Gaussian per channel, in [`NoiseChannel::ALL`] order.
    ///
    /// A stdev at or below zero leaves that channel untouched.
    pub fn from_stdevs(stdevs: [f32; 5]) -> Result<Self, NoiseError> {
        let mut noise = Self::none();
        for (channel, stdev) in NoiseChannel::ALL.into_iter().zip(stdevs) {
            noise.models[channel.index()] = NoiseModel::from_stdev(stdev)?;
        }
        Ok(noise)
    }

    pub fn model(&self, channel: NoiseChannel) -> &NoiseModel {
        &self.models[channel.index()]
    }

    /// Apply the channel's model to every value in place.
    pub fn apply<R: Rng + ?Sized>(&self, channel: NoiseChannel, values: &mut [f32], rng: &mut R) {
        self.models[channel.index()].apply_slice(values, rng);
    }

    /// True if no channel changes any value.
    pub fn is_passthrough(&self) -> bool {
        self.models.iter().all(NoiseModel::is_passthrough)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
