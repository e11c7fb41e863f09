//! The robot-side surface the randomizer writes to.

use strider_core::StriderError;

/// Reference values and setters a randomized robot exposes.
///
/// Setters validate their input before touching the simulator; an error
/// leaves the robot unchanged.
pub trait RandomizationTarget {
    fn num_motors(&self) -> usize;

    fn num_legs(&self) -> usize;

    /// Knee joints whose friction can be set.
    fn num_knee_joints(&self) -> usize;

    /// Chassis link masses as loaded from the robot model.
    fn base_masses_from_model(&self) -> Vec<f32>;

    /// Leg and motor link masses as loaded from the robot model.
    fn leg_masses_from_model(&self) -> Vec<f32>;

    fn base_inertias_from_model(&self) -> Vec<[f32; 3]>;

    fn leg_inertias_from_model(&self) -> Vec<[f32; 3]>;

    fn set_base_masses(&mut self, masses: &[f32]) -> Result<(), StriderError>;

    fn set_leg_masses(&mut self, masses: &[f32]) -> Result<(), StriderError>;

    fn set_base_inertias(&mut self, inertias: &[[f32; 3]]) -> Result<(), StriderError>;

    fn set_leg_inertias(&mut self, inertias: &[[f32; 3]]) -> Result<(), StriderError>;

    /// Sensor latency in seconds.
    fn set_control_latency(&mut self, latency: f64);

    fn set_joint_frictions(&mut self, frictions: &[f32]) -> Result<(), StriderError>;

    fn set_motor_viscous_damping(&mut self, damping: f32);

    fn set_foot_restitution(&mut self, restitution: f32) -> Result<(), StriderError>;

    fn set_foot_friction(&mut self, friction: f32) -> Result<(), StriderError>;

    fn set_battery_voltage(&mut self, volts: f32);

    fn set_motor_strength_ratios(&mut self, ratios: &[f32]) -> Result<(), StriderError>;

    /// Physics sub-steps per control step.
    fn set_action_repeat(&mut self, repeat: usize) -> Result<(), StriderError>;
}
