//! Orientation math and the per-step snapshot sensors read from.

use std::f32::consts::{PI, TAU};

use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use rand::Rng;
use strider_core::RawObservation;
use strider_env::SensorSource;
use strider_noise::prelude::{NoiseChannel, ObservationNoise};

// ---------------------------------------------------------------------------
// Math helpers
// ---------------------------------------------------------------------------

/// Map an angle into `[-π, π)`.
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = angle % TAU;
    if wrapped >= PI {
        wrapped - TAU
    } else if wrapped < -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

/// Unit quaternion from `[x, y, z, w]`.
pub fn to_unit(q: [f32; 4]) -> UnitQuaternion<f32> {
    UnitQuaternion::from_quaternion(Quaternion::new(q[3], q[0], q[1], q[2]))
}

/// `[x, y, z, w]` of a unit quaternion.
pub fn from_unit(q: &UnitQuaternion<f32>) -> [f32; 4] {
    [q.i, q.j, q.k, q.w]
}

/// `orientation` expressed relative to `reference`.
pub fn relative_orientation(orientation: [f32; 4], reference: [f32; 4]) -> [f32; 4] {
    from_unit(&(to_unit(orientation) * to_unit(reference).inverse()))
}

/// Roll, pitch and yaw (rotations about fixed x, y, z).
pub fn roll_pitch_yaw(q: [f32; 4]) -> [f32; 3] {
    let (roll, pitch, yaw) = to_unit(q).euler_angles();
    [roll, pitch, yaw]
}

/// Quaternion `[x, y, z, w]` from roll, pitch and yaw.
pub fn quaternion_from_rpy(rpy: [f32; 3]) -> [f32; 4] {
    from_unit(&UnitQuaternion::from_euler_angles(rpy[0], rpy[1], rpy[2]))
}

/// World-frame angular velocity expressed in the frame of `orientation`.
pub fn to_local_frame(angular_velocity: [f32; 3], orientation: [f32; 4]) -> [f32; 3] {
    let v = Vector3::new(angular_velocity[0], angular_velocity[1], angular_velocity[2]);
    let local = to_unit(orientation).inverse_transform_vector(&v);
    [local.x, local.y, local.z]
}

// ---------------------------------------------------------------------------
// Readings
// ---------------------------------------------------------------------------

/// Delayed, noisy readings available to the policy.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Readings {
    /// Wrapped to `[-π, π)`.
    pub motor_angles: Vec<f32>,
    pub motor_velocities: Vec<f32>,
    pub motor_torques: Vec<f32>,
    pub roll_pitch_yaw: [f32; 3],
    pub roll_pitch_yaw_rate: [f32; 3],
    /// Last absolute motor target, not delayed.
    pub last_action: Vec<f32>,
}

impl Readings {
    pub fn zeros(num_motors: usize) -> Self {
        Self {
            motor_angles: vec![0.0; num_motors],
            motor_velocities: vec![0.0; num_motors],
            motor_torques: vec![0.0; num_motors],
            roll_pitch_yaw: [0.0; 3],
            roll_pitch_yaw_rate: [0.0; 3],
            last_action: vec![0.0; num_motors],
        }
    }

    /// Readings from a delayed observation with sensor noise added.
    pub fn observe<R: Rng + ?Sized>(
        delayed: &RawObservation,
        last_action: &[f32],
        noise: &ObservationNoise,
        rng: &mut R,
    ) -> Self {
        let mut motor_angles = delayed.motor_angles.clone();
        let mut motor_velocities = delayed.motor_velocities.clone();
        let mut motor_torques = delayed.motor_torques.clone();
        let mut rpy = roll_pitch_yaw(delayed.base_orientation);
        let mut rate = delayed.base_rate;
        noise.apply(NoiseChannel::MotorAngle, &mut motor_angles, rng);
        noise.apply(NoiseChannel::MotorVelocity, &mut motor_velocities, rng);
        noise.apply(NoiseChannel::MotorTorque, &mut motor_torques, rng);
        noise.apply(NoiseChannel::RollPitchYaw, &mut rpy, rng);
        noise.apply(NoiseChannel::RollPitchYawRate, &mut rate, rng);
        for angle in &mut motor_angles {
            *angle = wrap_angle(*angle);
        }
        Self {
            motor_angles,
            motor_velocities,
            motor_torques,
            roll_pitch_yaw: rpy,
            roll_pitch_yaw_rate: rate,
            last_action: last_action.to_vec(),
        }
    }

    /// `|τ · q̇|` of the observed torques and velocities.
    pub fn power(&self) -> f32 {
        self.motor_torques
            .iter()
            .zip(&self.motor_velocities)
            .map(|(t, v)| t * v)
            .sum::<f32>()
            .abs()
    }
}

impl SensorSource for Readings {
    fn num_motors(&self) -> usize {
        self.motor_angles.len()
    }

    fn motor_angles(&self) -> Vec<f32> {
        self.motor_angles.clone()
    }

    fn base_roll_pitch_yaw(&self) -> [f32; 3] {
        self.roll_pitch_yaw
    }

    fn base_roll_pitch_yaw_rate(&self) -> [f32; 3] {
        self.roll_pitch_yaw_rate
    }

    fn last_action(&self) -> Vec<f32> {
        self.last_action.clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
