use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Ids
// ---------------------------------------------------------------------------

/// Handle to a body loaded in the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(pub u32);

/// Link index within a body. The base link is [`BASE_LINK`].
pub type LinkId = i32;

/// Link id of the base (chassis root) of a body.
pub const BASE_LINK: LinkId = -1;

// ---------------------------------------------------------------------------
// Simulator records
// ---------------------------------------------------------------------------

/// Angle and velocity of a single joint, in simulator (joint) space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct JointReading {
    pub angle: f32,
    pub velocity: f32,
}

impl JointReading {
    pub const fn new(angle: f32, velocity: f32) -> Self {
        Self { angle, velocity }
    }
}

/// Static information about one joint of a loaded body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JointInfo {
    pub index: LinkId,
    pub name: String,
}

/// World-frame base position and orientation quaternion `[x, y, z, w]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BasePose {
    pub position: [f32; 3],
    pub orientation: [f32; 4],
}

impl Default for BasePose {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            orientation: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

/// World-frame base linear and angular velocity.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BaseVelocity {
    pub linear: [f32; 3],
    pub angular: [f32; 3],
}

/// Dynamics parameter written through
/// [`SimulatorLink::set_dynamics_param`](crate::sim::SimulatorLink::set_dynamics_param).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DynamicsParam {
    Mass(f32),
    LocalInertiaDiagonal([f32; 3]),
    LateralFriction(f32),
    Restitution(f32),
}

/// Dynamics of a link as reported by the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DynamicsInfo {
    pub mass: f32,
    pub local_inertia_diagonal: [f32; 3],
    pub lateral_friction: f32,
    pub restitution: f32,
}

// ---------------------------------------------------------------------------
// RawObservation
// ---------------------------------------------------------------------------

/// Noise-free reading of the robot, produced once per physics step.
///
/// Motor quantities are in motor space (direction and offset applied). The
/// orientation is relative to the robot's initial orientation and the rate
/// is expressed in the base frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
    pub motor_angles: Vec<f32>,
    pub motor_velocities: Vec<f32>,
    pub motor_torques: Vec<f32>,
    pub base_orientation: [f32; 4],
    pub base_rate: [f32; 3],
}

impl RawObservation {
    /// All-zero observation for `num_motors` motors with identity orientation.
    pub fn zeros(num_motors: usize) -> Self {
        Self {
            motor_angles: vec![0.0; num_motors],
            motor_velocities: vec![0.0; num_motors],
            motor_torques: vec![0.0; num_motors],
            base_orientation: [0.0, 0.0, 0.0, 1.0],
            base_rate: [0.0; 3],
        }
    }

    pub fn num_motors(&self) -> usize {
        self.motor_angles.len()
    }

    /// Flattened length: `3 * num_motors + 7`.
    pub fn flat_len(&self) -> usize {
        3 * self.num_motors() + 7
    }

    /// Flatten as angles, velocities, torques, orientation, rate.
    pub fn to_flat(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.flat_len());
        out.extend_from_slice(&self.motor_angles);
        out.extend_from_slice(&self.motor_velocities);
        out.extend_from_slice(&self.motor_torques);
        out.extend_from_slice(&self.base_orientation);
        out.extend_from_slice(&self.base_rate);
        out
    }

    /// Element-wise `(1 - blend) * self + blend * other`.
    ///
    /// The orientation is blended component-wise and not renormalized.
    #[must_use]
    pub fn lerp(&self, other: &Self, blend: f32) -> Self {
        let mix = |a: f32, b: f32| (1.0 - blend).mul_add(a, blend * b);
        let mix_vec =
            |a: &[f32], b: &[f32]| a.iter().zip(b).map(|(&x, &y)| mix(x, y)).collect::<Vec<_>>();
        Self {
            motor_angles: mix_vec(&self.motor_angles, &other.motor_angles),
            motor_velocities: mix_vec(&self.motor_velocities, &other.motor_velocities),
            motor_torques: mix_vec(&self.motor_torques, &other.motor_torques),
            base_orientation: std::array::from_fn(|i| {
                mix(self.base_orientation[i], other.base_orientation[i])
            }),
            base_rate: std::array::from_fn(|i| mix(self.base_rate[i], other.base_rate[i])),
        }
    }
}
