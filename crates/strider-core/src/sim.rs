//! Engine-agnostic simulator link.
//!
//! Any rigid-body engine implements [`SimulatorLink`] and is handed to the
//! robot at construction. The robot never advances dynamics itself; it only
//! reads joint and base state and writes torques and dynamics parameters.

use crate::error::SimError;
use crate::types::{
    BaseVelocity, BasePose, BodyId, DynamicsInfo, DynamicsParam, JointInfo, JointReading, LinkId,
};

/// What a body is loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodySource<'a> {
    /// Robot model file (URDF or equivalent).
    pub model: &'a str,
    pub self_collision: bool,
}

/// Trait that concrete physics engines must implement.
///
/// Joint quantities are in joint space; motor direction and offset are
/// applied by the caller.
pub trait SimulatorLink: Send + Sync + 'static {
    /// Load a body at `pose` and return its handle.
    fn load_body(&mut self, source: BodySource<'_>, pose: BasePose) -> Result<BodyId, SimError>;

    /// Number of joints of `body`.
    fn num_joints(&self, body: BodyId) -> Result<usize, SimError>;

    /// Name and index of joint `index`.
    fn joint_info(&self, body: BodyId, index: usize) -> Result<JointInfo, SimError>;

    /// Angle and velocity of each joint in `joints`, in the same order.
    fn joint_states(&self, body: BodyId, joints: &[LinkId])
    -> Result<Vec<JointReading>, SimError>;

    fn base_pose(&self, body: BodyId) -> Result<BasePose, SimError>;

    fn base_velocity(&self, body: BodyId) -> Result<BaseVelocity, SimError>;

    /// Command one torque per joint in `joints`.
    fn set_joint_torques(
        &mut self,
        body: BodyId,
        joints: &[LinkId],
        torques: &[f32],
    ) -> Result<(), SimError>;

    /// Set a dynamics parameter of one link.
    fn set_dynamics_param(
        &mut self,
        body: BodyId,
        link: LinkId,
        param: DynamicsParam,
    ) -> Result<(), SimError>;

    fn dynamics_info(&self, body: BodyId, link: LinkId) -> Result<DynamicsInfo, SimError>;

    /// Dry friction of a joint, realized as a zero-velocity motor with
    /// bounded force.
    fn set_joint_friction(
        &mut self,
        body: BodyId,
        joint: LinkId,
        friction: f32,
    ) -> Result<(), SimError>;

    /// Remove the engine's default linear and angular damping from a link.
    fn clear_link_damping(&mut self, body: BodyId, link: LinkId) -> Result<(), SimError>;

    fn reset_base(
        &mut self,
        body: BodyId,
        pose: BasePose,
        velocity: BaseVelocity,
    ) -> Result<(), SimError>;

    fn reset_joint_state(
        &mut self,
        body: BodyId,
        joint: LinkId,
        angle: f32,
        velocity: f32,
    ) -> Result<(), SimError>;

    /// Pin the base to a fixed world frame.
    fn create_rack_constraint(&mut self, body: BodyId, pose: BasePose) -> Result<(), SimError>;

    /// Advance the simulation by one physics step.
    fn step_simulation(&mut self) -> Result<(), SimError>;

    /// Human-readable engine name.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
