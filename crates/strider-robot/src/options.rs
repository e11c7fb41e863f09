//! Behavior switches of one robot instance.
//!
//! [`RobotDescriptor`](strider_core::RobotDescriptor) says what the robot
//! is; [`RobotOptions`] says how this instance runs it.

use std::path::Path;

use serde::{Deserialize, Serialize};
use strider_actuator_core::prelude::{ControlMode, ShaperConfig};
use strider_core::ConfigError;
use strider_domain_rand::prelude::{ParamBounds, RandomizationSpec};
use strider_env::{ImuChannel, ImuSensor, Sensor};

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

fn default_randomization_spec() -> String {
    "all_params".into()
}
const fn default_settle_steps() -> usize {
    500
}
const fn default_reset_time() -> f64 {
    3.0
}
fn default_imu_channels() -> Vec<ImuChannel> {
    ImuSensor::new().channels().to_vec()
}
fn default_sensors() -> Vec<SensorConfig> {
    vec![
        SensorConfig::MotorAngle { history: 0 },
        SensorConfig::Imu {
            channels: default_imu_channels(),
            history: 0,
        },
    ]
}

// ---------------------------------------------------------------------------
// SensorConfig
// ---------------------------------------------------------------------------

/// One sensor to register, optionally wrapped with `history` past frames.
///
/// ```toml
/// [[sensors]]
/// kind = "imu"
/// channels = ["roll", "pitch", "yaw_rate"]
///
/// [[sensors]]
/// kind = "last_action"
/// history = 3
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SensorConfig {
    MotorAngle {
        #[serde(default)]
        history: usize,
    },
    Imu {
        #[serde(default = "default_imu_channels")]
        channels: Vec<ImuChannel>,
        #[serde(default)]
        history: usize,
    },
    LastAction {
        #[serde(default)]
        history: usize,
    },
}

impl SensorConfig {
    /// Build the sensor. A `history` of 0 leaves it unwrapped.
    pub fn build(&self) -> Sensor {
        let (sensor, history) = match self {
            Self::MotorAngle { history } => (Sensor::motor_angle(), *history),
            Self::Imu { channels, history } => (Sensor::imu(channels.clone()), *history),
            Self::LastAction { history } => (Sensor::last_action(), *history),
        };
        if history > 0 {
            sensor.historic(history)
        } else {
            sensor
        }
    }
}

// ---------------------------------------------------------------------------
// RobotOptions
// ---------------------------------------------------------------------------

/// Per-instance robot configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RobotOptions {
    /// Mode used when `apply_action` is given none (default: position).
    #[serde(default)]
    pub control_mode: ControlMode,

    /// Pin the base to a fixed frame above the ground.
    #[serde(default)]
    pub on_rack: bool,

    /// On a soft reset, keep the base's current x, y and heading.
    #[serde(default)]
    pub reset_at_current_position: bool,

    #[serde(default)]
    pub self_collision: bool,

    #[serde(default)]
    pub shaper: ShaperConfig,

    /// Disable motors that stay above the overheat torque for too long.
    #[serde(default)]
    pub motor_overheat_protection: bool,

    /// Randomize physical parameters on every reset.
    #[serde(default)]
    pub enable_randomizer: bool,

    /// Name of a built-in randomization spec (default: `all_params`).
    #[serde(default = "default_randomization_spec")]
    pub randomization_spec: String,

    /// Inline parameter ranges, used instead of `randomization_spec` when set.
    ///
    /// ```toml
    /// [randomization_ranges]
    /// battery = [14.0, 16.8]
    /// "control step" = [4.0, 8.0]
    /// ```
    #[serde(default)]
    pub randomization_ranges: Option<RandomizationSpec>,

    /// When set, every episode draws the same sample.
    #[serde(default)]
    pub randomization_seed: Option<u64>,

    #[serde(default)]
    pub param_bounds: ParamBounds,

    /// Position-hold steps at the initial angles during reset (default: 500).
    #[serde(default = "default_settle_steps")]
    pub settle_steps: usize,

    /// Seconds to hold `default_motor_angles` after settling. At or below
    /// zero, reset skips settling entirely (default: 3).
    #[serde(default = "default_reset_time")]
    pub reset_time: f64,

    /// Pose held for `reset_time` after settling, if any.
    #[serde(default)]
    pub default_motor_angles: Option<Vec<f32>>,

    /// Root of the seed hierarchy.
    #[serde(default)]
    pub seed: u64,

    /// Index of this instance among parallel robots.
    #[serde(default)]
    pub instance: u64,

    #[serde(default = "default_sensors")]
    pub sensors: Vec<SensorConfig>,
}

impl Default for RobotOptions {
    fn default() -> Self {
        Self {
            control_mode: ControlMode::default(),
            on_rack: false,
            reset_at_current_position: false,
            self_collision: false,
            shaper: ShaperConfig::default(),
            motor_overheat_protection: false,
            enable_randomizer: false,
            randomization_spec: default_randomization_spec(),
            randomization_ranges: None,
            randomization_seed: None,
            param_bounds: ParamBounds::default(),
            settle_steps: default_settle_steps(),
            reset_time: default_reset_time(),
            default_motor_angles: None,
            seed: 0,
            instance: 0,
            sensors: default_sensors(),
        }
    }
}

impl RobotOptions {
    /// Builder: skip settling on reset.
    #[must_use]
    pub fn without_settling(mut self) -> Self {
        self.reset_time = 0.0;
        self
    }

    #[must_use]
    pub fn with_sensors(mut self, sensors: Vec<SensorConfig>) -> Self {
        self.sensors = sensors;
        self
    }

    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Validate against a robot with `num_motors` motors.
    pub fn validate(&self, num_motors: usize) -> Result<(), ConfigError> {
        if self.on_rack && self.reset_at_current_position {
            return Err(ConfigError::Incompatible(
                "on_rack and reset_at_current_position cannot be enabled together".into(),
            ));
        }
        if let Some(angles) = &self.default_motor_angles {
            ConfigError::check_len("default_motor_angles", num_motors, angles.len())?;
        }
        if !self.reset_time.is_finite() {
            return Err(ConfigError::invalid("reset_time", "must be finite"));
        }
        Ok(())
    }

    /// Inline ranges if given, else the named built-in spec.
    pub fn resolve_randomization_spec(&self) -> Result<RandomizationSpec, ConfigError> {
        match &self.randomization_ranges {
            Some(spec) => Ok(spec.clone()),
            None => RandomizationSpec::by_name(&self.randomization_spec),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
