//! Named randomization parameters: how each is drawn and applied.

use rand::Rng;
use serde::{Deserialize, Serialize};
use strider_core::{ConfigError, StriderError};

use crate::ranges::{ParamBounds, ParamRange};
use crate::sample::SampleValue;
use crate::target::RandomizationTarget;

// ---------------------------------------------------------------------------
// RandomizationParam
// ---------------------------------------------------------------------------

/// A physical quantity the randomizer can perturb.
///
/// Variants are declared in name order, so the derived `Ord` sorts by name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RandomizationParam {
    /// One ratio for every chassis link mass.
    #[serde(rename = "base mass")]
    BaseMass,
    /// Battery voltage.
    #[serde(rename = "battery")]
    Battery,
    /// Physics sub-steps per control step.
    #[serde(rename = "control step")]
    ControlStep,
    /// One strength ratio for every motor.
    #[serde(rename = "global motor strength")]
    GlobalMotorStrength,
    /// Per-axis ratio for every chassis and leg link inertia.
    #[serde(rename = "individual inertia")]
    IndividualInertia,
    /// Per-link ratio for every chassis and leg link mass.
    #[serde(rename = "individual mass")]
    IndividualMass,
    /// Base and leg inertia ratios.
    #[serde(rename = "inertia")]
    Inertia,
    /// Per-knee joint friction.
    #[serde(rename = "joint friction")]
    JointFriction,
    /// Sensor latency in seconds.
    #[serde(rename = "latency")]
    Latency,
    /// Foot lateral friction.
    #[serde(rename = "lateral friction")]
    LateralFriction,
    /// Weakens the motors of one randomly chosen leg.
    #[serde(rename = "leg weaken")]
    LegWeaken,
    /// Base and leg mass ratios.
    #[serde(rename = "mass")]
    Mass,
    /// Motor viscous damping.
    #[serde(rename = "motor friction")]
    MotorFriction,
    /// Per-motor strength ratios.
    #[serde(rename = "motor strength")]
    MotorStrength,
    /// Foot restitution.
    #[serde(rename = "restitution")]
    Restitution,
    /// Weakens the motors of the first leg.
    #[serde(rename = "single leg weaken")]
    SingleLegWeaken,
}

impl RandomizationParam {
    pub const ALL: [Self; 16] = [
        Self::BaseMass,
        Self::Battery,
        Self::ControlStep,
        Self::GlobalMotorStrength,
        Self::IndividualInertia,
        Self::IndividualMass,
        Self::Inertia,
        Self::JointFriction,
        Self::Latency,
        Self::LateralFriction,
        Self::LegWeaken,
        Self::Mass,
        Self::MotorFriction,
        Self::MotorStrength,
        Self::Restitution,
        Self::SingleLegWeaken,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::BaseMass => "base mass",
            Self::Battery => "battery",
            Self::ControlStep => "control step",
            Self::GlobalMotorStrength => "global motor strength",
            Self::IndividualInertia => "individual inertia",
            Self::IndividualMass => "individual mass",
            Self::Inertia => "inertia",
            Self::JointFriction => "joint friction",
            Self::Latency => "latency",
            Self::LateralFriction => "lateral friction",
            Self::LegWeaken => "leg weaken",
            Self::Mass => "mass",
            Self::MotorFriction => "motor friction",
            Self::MotorStrength => "motor strength",
            Self::Restitution => "restitution",
            Self::SingleLegWeaken => "single leg weaken",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        Self::ALL
            .into_iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| ConfigError::UnknownRandomizationParam(name.to_owned()))
    }

    /// Normalized values one draw produces for `target`.
    pub fn draw_dim(self, target: &dyn RandomizationTarget) -> usize {
        match self {
            Self::Mass | Self::Inertia | Self::LegWeaken => 2,
            Self::IndividualMass => {
                target.base_masses_from_model().len() + target.leg_masses_from_model().len()
            }
            Self::IndividualInertia => {
                3 * (target.base_inertias_from_model().len()
                    + target.leg_inertias_from_model().len())
            }
            Self::JointFriction => target.num_knee_joints(),
            Self::MotorStrength => target.num_motors(),
            Self::BaseMass
            | Self::Battery
            | Self::ControlStep
            | Self::GlobalMotorStrength
            | Self::Latency
            | Self::LateralFriction
            | Self::MotorFriction
            | Self::Restitution
            | Self::SingleLegWeaken => 1,
        }
    }

    /// Draw a fresh normalized sample.
    pub fn draw<R: Rng + ?Sized>(
        self,
        rng: &mut R,
        bounds: ParamBounds,
        target: &dyn RandomizationTarget,
    ) -> SampleValue {
        match self {
            Self::LegWeaken => {
                let leg = rng.gen_range(0..target.num_legs().max(1));
                SampleValue::LegWeaken {
                    leg,
                    ratio: bounds.sample(rng),
                }
            }
            Self::Mass
            | Self::Inertia
            | Self::IndividualMass
            | Self::IndividualInertia
            | Self::JointFriction
            | Self::MotorStrength => {
                SampleValue::Vector(bounds.sample_n(rng, self.draw_dim(target)))
            }
            _ => SampleValue::Scalar(bounds.sample(rng)),
        }
    }

    /// Apply a normalized sample to `target`.
    ///
    /// Returns the physical values written, used for rejection checks.
    /// Strength ratios are clamped into `[0, 1]` before writing, and the
    /// clamped values are what is returned.
    pub fn apply(
        self,
        sample: &SampleValue,
        range: &ParamRange,
        bounds: ParamBounds,
        target: &mut dyn RandomizationTarget,
    ) -> Result<Vec<f32>, StriderError> {
        let physical = match (self, sample) {
            (Self::LegWeaken, SampleValue::LegWeaken { leg, ratio }) => {
                let ratio = unit_ratio(range.transform(*ratio, bounds));
                let ratios = weakened_leg(target, *leg, ratio)?;
                target.set_motor_strength_ratios(&ratios)?;
                vec![ratio]
            }
            (Self::LegWeaken, _) | (_, SampleValue::LegWeaken { .. }) => {
                return Err(self.shape_error(sample).into());
            }
            (_, SampleValue::Scalar(s)) if self.is_scalar() => {
                let value = range.transform(*s, bounds);
                self.apply_scalar(value, target)?
            }
            (_, SampleValue::Vector(values)) if !self.is_scalar() => {
                ConfigError::check_len(self.name(), self.draw_dim(target), values.len())?;
                let mut physical = range.transform_all(values, bounds);
                if self == Self::MotorStrength {
                    physical.iter_mut().for_each(|v| *v = unit_ratio(*v));
                }
                self.apply_vector(&physical, target)?;
                physical
            }
            _ => return Err(self.shape_error(sample).into()),
        };
        Ok(physical)
    }

    const fn is_scalar(self) -> bool {
        !matches!(
            self,
            Self::Mass
                | Self::Inertia
                | Self::IndividualMass
                | Self::IndividualInertia
                | Self::JointFriction
                | Self::MotorStrength
                | Self::LegWeaken
        )
    }

    fn shape_error(self, sample: &SampleValue) -> ConfigError {
        ConfigError::invalid(
            self.name(),
            format!("sample {sample:?} does not match the parameter's shape"),
        )
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    fn apply_scalar(
        self,
        value: f32,
        target: &mut dyn RandomizationTarget,
    ) -> Result<Vec<f32>, StriderError> {
        match self {
            Self::BaseMass => {
                let masses = scaled(&target.base_masses_from_model(), value);
                target.set_base_masses(&masses)?;
            }
            Self::Battery => target.set_battery_voltage(value),
            Self::ControlStep => {
                let repeat = action_repeat_for(value);
                target.set_action_repeat(repeat)?;
                return Ok(vec![repeat as f32]);
            }
            Self::GlobalMotorStrength => {
                let ratio = unit_ratio(value);
                target.set_motor_strength_ratios(&vec![ratio; target.num_motors()])?;
                return Ok(vec![ratio]);
            }
            Self::Latency => target.set_control_latency(f64::from(value)),
            Self::LateralFriction => target.set_foot_friction(value)?,
            Self::MotorFriction => target.set_motor_viscous_damping(value),
            Self::Restitution => target.set_foot_restitution(value)?,
            Self::SingleLegWeaken => {
                let ratio = unit_ratio(value);
                let ratios = weakened_leg(target, 0, ratio)?;
                target.set_motor_strength_ratios(&ratios)?;
                return Ok(vec![ratio]);
            }
            _ => return Err(self.shape_error(&SampleValue::Scalar(value)).into()),
        }
        Ok(vec![value])
    }

    fn apply_vector(
        self,
        values: &[f32],
        target: &mut dyn RandomizationTarget,
    ) -> Result<(), StriderError> {
        match self {
            Self::Mass => {
                let base = scaled(&target.base_masses_from_model(), values[0]);
                let leg = scaled(&target.leg_masses_from_model(), values[1]);
                target.set_base_masses(&base)?;
                target.set_leg_masses(&leg)?;
            }
            Self::IndividualMass => {
                let base_ref = target.base_masses_from_model();
                let leg_ref = target.leg_masses_from_model();
                let (base_ratio, leg_ratio) = values.split_at(base_ref.len());
                let base: Vec<f32> = base_ref.iter().zip(base_ratio).map(|(m, r)| m * r).collect();
                let leg: Vec<f32> = leg_ref.iter().zip(leg_ratio).map(|(m, r)| m * r).collect();
                target.set_base_masses(&base)?;
                target.set_leg_masses(&leg)?;
            }
            Self::Inertia => {
                let base = scaled_inertia(&target.base_inertias_from_model(), &[values[0]; 3]);
                let leg = scaled_inertia(&target.leg_inertias_from_model(), &[values[1]; 3]);
                target.set_base_inertias(&base)?;
                target.set_leg_inertias(&leg)?;
            }
            Self::IndividualInertia => {
                let base_ref = target.base_inertias_from_model();
                let leg_ref = target.leg_inertias_from_model();
                let (base_ratio, leg_ratio) = values.split_at(3 * base_ref.len());
                let base = per_axis(&base_ref, base_ratio);
                let leg = per_axis(&leg_ref, leg_ratio);
                target.set_base_inertias(&base)?;
                target.set_leg_inertias(&leg)?;
            }
            Self::JointFriction => target.set_joint_frictions(values)?,
            Self::MotorStrength => target.set_motor_strength_ratios(values)?,
            _ => return Err(self.shape_error(&SampleValue::Vector(values.to_vec())).into()),
        }
        Ok(())
    }
}

/// Action repeat a `control step` value maps to: truncated, at least 1.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn action_repeat_for(value: f32) -> usize {
    (value.max(0.0) as usize).max(1)
}

fn unit_ratio(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

fn scaled(values: &[f32], ratio: f32) -> Vec<f32> {
    values.iter().map(|v| v * ratio).collect()
}

fn scaled_inertia(values: &[[f32; 3]], ratio: &[f32; 3]) -> Vec<[f32; 3]> {
    values
        .iter()
        .map(|i| [i[0] * ratio[0], i[1] * ratio[1], i[2] * ratio[2]])
        .collect()
}

fn per_axis(values: &[[f32; 3]], ratios: &[f32]) -> Vec<[f32; 3]> {
    values
        .iter()
        .zip(ratios.chunks_exact(3))
        .map(|(i, r)| [i[0] * r[0], i[1] * r[1], i[2] * r[2]])
        .collect()
}

/// Strength ratios of 1 except `ratio` on every motor of `leg`.
fn weakened_leg(
    target: &dyn RandomizationTarget,
    leg: usize,
    ratio: f32,
) -> Result<Vec<f32>, ConfigError> {
    let num_motors = target.num_motors();
    let num_legs = target.num_legs().max(1);
    if leg >= num_legs {
        return Err(ConfigError::invalid(
            "leg weaken",
            format!("leg {leg} out of range for {num_legs} legs"),
        ));
    }
    let per_leg = num_motors / num_legs;
    let mut ratios = vec![1.0; num_motors];
    for r in &mut ratios[leg * per_leg..(leg + 1) * per_leg] {
        *r = ratio;
    }
    Ok(ratios)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
