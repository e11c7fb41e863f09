//! Control modes and the PD law shared by position and hybrid control.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ControlMode
// ---------------------------------------------------------------------------

/// How a motor command is interpreted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlMode {
    /// Target angle (rad) tracked by the motor's PD gains.
    #[default]
    Position,
    /// Torque (Nm) passed straight through.
    Torque,
    /// Per motor: angle, velocity, kp, kd, feed-forward torque.
    Hybrid,
}

/// Values per motor in a [`ControlMode::Hybrid`] command.
pub const HYBRID_COMMAND_SIZE: usize = 5;

impl ControlMode {
    /// Command values per motor in this mode.
    pub const fn values_per_motor(self) -> usize {
        match self {
            Self::Position | Self::Torque => 1,
            Self::Hybrid => HYBRID_COMMAND_SIZE,
        }
    }

    /// Expected command length for `num_motors` motors.
    pub const fn command_len(self, num_motors: usize) -> usize {
        self.values_per_motor() * num_motors
    }
}

// ---------------------------------------------------------------------------
// HybridCommand
// ---------------------------------------------------------------------------

/// One motor's slice of a hybrid command.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HybridCommand {
    pub angle: f32,
    pub velocity: f32,
    pub kp: f32,
    pub kd: f32,
    pub torque: f32,
}

impl HybridCommand {
    /// Read motor `index` from a packed hybrid command.
    ///
    /// `packed` must hold at least `HYBRID_COMMAND_SIZE * (index + 1)` values.
    pub fn unpack(packed: &[f32], index: usize) -> Self {
        let base = index * HYBRID_COMMAND_SIZE;
        Self {
            angle: packed[base],
            velocity: packed[base + 1],
            kp: packed[base + 2],
            kd: packed[base + 3],
            torque: packed[base + 4],
        }
    }

    /// Append this command to a packed buffer.
    pub fn pack_into(&self, packed: &mut Vec<f32>) {
        packed.extend_from_slice(&[self.angle, self.velocity, self.kp, self.kd, self.torque]);
    }
}

// ---------------------------------------------------------------------------
// PdLaw
// ---------------------------------------------------------------------------

/// Stateless PD law.
///
/// Output: `kp × (target_angle - angle) + kd × (target_velocity - velocity)`.
///
/// Gains:
/// - `kp`: `Nm/rad`.
/// - `kd`: `Nm·s/rad`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PdLaw {
    pub kp: f32,
    pub kd: f32,
}

impl PdLaw {
    pub const fn new(kp: f32, kd: f32) -> Self {
        Self { kp, kd }
    }

    /// Torque for the given targets and measurements.
    pub fn torque(&self, target_angle: f32, angle: f32, target_velocity: f32, velocity: f32) -> f32 {
        self.kp
            .mul_add(target_angle - angle, self.kd * (target_velocity - velocity))
    }

    /// Torque holding `target_angle` at rest.
    pub fn hold(&self, target_angle: f32, angle: f32, velocity: f32) -> f32 {
        self.torque(target_angle, angle, 0.0, velocity)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
