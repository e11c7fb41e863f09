use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_dofs_per_leg() -> usize {
    3
}
const fn default_time_step() -> f64 {
    0.001
}
const fn default_action_repeat() -> usize {
    10
}
const fn default_orientation() -> [f32; 4] {
    [0.0, 0.0, 0.0, 1.0]
}
const fn default_rack_position() -> [f32; 3] {
    [0.0, 0.0, 1.0]
}
const fn default_control_latency() -> f64 {
    0.002
}
const fn default_max_motor_angle_step() -> f32 {
    0.2
}
const fn default_overheat_torque() -> f32 {
    2.45
}
const fn default_overheat_time() -> f64 {
    1.0
}
const fn default_nominal_voltage() -> f32 {
    16.0
}
const fn default_gain() -> PerMotor {
    PerMotor::Uniform(1.0)
}

// ---------------------------------------------------------------------------
// PerMotor
// ---------------------------------------------------------------------------

/// A value given either once for every motor or once per motor.
///
/// Deserializes from a bare number or an array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PerMotor {
    Uniform(f32),
    Each(Vec<f32>),
}

impl PerMotor {
    /// Expand to one value per motor.
    pub fn expand(&self, what: &'static str, num_motors: usize) -> Result<Vec<f32>, ConfigError> {
        match self {
            Self::Uniform(v) => Ok(vec![*v; num_motors]),
            Self::Each(values) => {
                ConfigError::check_len(what, num_motors, values.len())?;
                Ok(values.clone())
            }
        }
    }
}

impl From<f32> for PerMotor {
    fn from(v: f32) -> Self {
        Self::Uniform(v)
    }
}

impl From<Vec<f32>> for PerMotor {
    fn from(v: Vec<f32>) -> Self {
        Self::Each(v)
    }
}

// ---------------------------------------------------------------------------
// JointPatterns
// ---------------------------------------------------------------------------

/// Regular expressions that classify joint names into link categories.
///
/// Patterns are tried in the order chassis, motor, knee, foot and are
/// anchored at the start of the joint name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JointPatterns {
    pub chassis: String,
    pub motor: String,
    pub knee: String,
    pub foot: String,
}

// ---------------------------------------------------------------------------
// RobotDescriptor
// ---------------------------------------------------------------------------

/// Static, data-only description of one legged robot.
///
/// Everything that differs between robot models lives here; the actuation
/// and sensing logic is shared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotDescriptor {
    pub name: String,

    /// Robot model file handed to the simulator.
    pub model: String,

    pub num_motors: usize,

    #[serde(default = "default_dofs_per_leg")]
    pub dofs_per_leg: usize,

    /// Physics step in seconds (default: 0.001).
    #[serde(default = "default_time_step")]
    pub time_step: f64,

    /// Physics sub-steps per control step (default: 10).
    #[serde(default = "default_action_repeat")]
    pub action_repeat: usize,

    #[serde(default)]
    pub init_position: [f32; 3],

    /// Base position used when the robot hangs on a rack.
    #[serde(default = "default_rack_position")]
    pub init_rack_position: [f32; 3],

    /// Initial base orientation quaternion `[x, y, z, w]`.
    #[serde(default = "default_orientation")]
    pub init_orientation: [f32; 4],

    /// Motor-space angles the robot starts in; actions are offsets from these.
    pub init_motor_angles: Vec<f32>,

    /// Per-motor sign mapping joint space to motor space.
    pub joint_directions: Vec<f32>,

    /// Per-motor offset subtracted from the joint angle.
    pub joint_offsets: Vec<f32>,

    /// Joint names of the motors, in motor order.
    pub motor_names: Vec<String>,

    #[serde(default = "default_gain")]
    pub kp: PerMotor,

    #[serde(default = "default_gain")]
    pub kd: PerMotor,

    #[serde(default)]
    pub torque_limits: Option<PerMotor>,

    /// Delay of the sensor values seen by the policy, in seconds.
    #[serde(default = "default_control_latency")]
    pub control_latency: f64,

    /// Delay of the feedback used by the motor PD loop, in seconds.
    #[serde(default)]
    pub pd_latency: f64,

    /// Largest change from the current angle a command may request per sub-step.
    #[serde(default = "default_max_motor_angle_step")]
    pub max_motor_angle_step: f32,

    #[serde(default = "default_overheat_torque")]
    pub overheat_torque: f32,

    #[serde(default = "default_overheat_time")]
    pub overheat_time: f64,

    #[serde(default = "default_nominal_voltage")]
    pub nominal_voltage: f32,

    /// Gaussian stdev for angle, velocity, torque, roll-pitch-yaw and rate
    /// readings. Values at or below zero leave the reading untouched.
    #[serde(default)]
    pub observation_noise_stdev: [f32; 5],

    pub joint_patterns: JointPatterns,
}

impl RobotDescriptor {
    pub const fn num_legs(&self) -> usize {
        self.num_motors / self.dofs_per_leg
    }

    /// Control-step duration in seconds.
    #[allow(clippy::cast_precision_loss)]
    pub fn control_time_step(&self) -> f64 {
        self.time_step * self.action_repeat as f64
    }

    /// Validate configuration. Returns Err on invalid values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_motors == 0 {
            return Err(ConfigError::invalid("num_motors", "must be > 0"));
        }
        if self.dofs_per_leg == 0 || self.num_motors % self.dofs_per_leg != 0 {
            return Err(ConfigError::invalid(
                "dofs_per_leg",
                format!(
                    "{} does not divide num_motors {}",
                    self.dofs_per_leg, self.num_motors
                ),
            ));
        }
        if self.time_step <= 0.0 {
            return Err(ConfigError::invalid(
                "time_step",
                format!("{} (must be > 0)", self.time_step),
            ));
        }
        if self.action_repeat == 0 {
            return Err(ConfigError::invalid("action_repeat", "must be >= 1"));
        }
        ConfigError::check_len("init_motor_angles", self.num_motors, self.init_motor_angles.len())?;
        ConfigError::check_len("joint_directions", self.num_motors, self.joint_directions.len())?;
        ConfigError::check_len("joint_offsets", self.num_motors, self.joint_offsets.len())?;
        ConfigError::check_len("motor_names", self.num_motors, self.motor_names.len())?;
        if let Some(i) = self
            .joint_directions
            .iter()
            .position(|d| (d.abs() - 1.0).abs() > f32::EPSILON)
        {
            return Err(ConfigError::invalid(
                "joint_directions",
                format!("entry {i} must be +1 or -1"),
            ));
        }
        self.kp.expand("kp", self.num_motors)?;
        self.kd.expand("kd", self.num_motors)?;
        if let Some(limits) = &self.torque_limits {
            let limits = limits.expand("torque_limits", self.num_motors)?;
            if limits.iter().any(|l| *l < 0.0) {
                return Err(ConfigError::invalid("torque_limits", "must be >= 0"));
            }
        }
        if self.control_latency < 0.0 || self.pd_latency < 0.0 {
            return Err(ConfigError::invalid("latency", "must be >= 0"));
        }
        if self.max_motor_angle_step <= 0.0 {
            return Err(ConfigError::invalid("max_motor_angle_step", "must be > 0"));
        }
        if self.overheat_time <= 0.0 {
            return Err(ConfigError::invalid("overheat_time", "must be > 0"));
        }
        if self.nominal_voltage <= 0.0 {
            return Err(ConfigError::invalid("nominal_voltage", "must be > 0"));
        }
        if self.init_orientation.iter().all(|q| *q == 0.0) {
            return Err(ConfigError::invalid(
                "init_orientation",
                "quaternion must be non-zero",
            ));
        }
        Ok(())
    }

    /// Parse from a TOML string and validate.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let descriptor: Self = toml::from_str(content)?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Load from TOML file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
