//! In-memory [`SimulatorLink`] for tests.
//!
//! Every joint is an independent unit-axis rotor integrated with
//! semi-implicit Euler; the base stays where it is put. Everything the robot
//! writes is recorded for inspection.

use std::collections::BTreeMap;

use strider_core::{
    BASE_LINK, BaseVelocity, BasePose, BodyId, BodySource, DynamicsInfo, DynamicsParam, JointInfo,
    JointReading, LinkId, SimError, SimulatorLink,
};

/// Rotor inertia of every mock joint (kg m²).
pub const JOINT_INERTIA: f32 = 0.05;

/// Mass of link `link` before anything is written.
#[allow(clippy::cast_precision_loss)]
pub fn default_link_mass(link: LinkId) -> f32 {
    1.0 + 0.25 * (link + 1) as f32
}

// ---------------------------------------------------------------------------
// MockJoint
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
pub struct MockJoint {
    pub name: String,
    pub angle: f32,
    pub velocity: f32,
    /// Torque held until the next write.
    pub torque: f32,
    pub friction: f32,
}

impl MockJoint {
    fn new(name: String) -> Self {
        Self {
            name,
            angle: 0.0,
            velocity: 0.0,
            torque: 0.0,
            friction: 0.0,
        }
    }

    fn integrate(&mut self, dt: f32) {
        let resist = self.friction * self.velocity.signum();
        let accel = (self.torque - resist) / JOINT_INERTIA;
        self.velocity = accel.mul_add(dt, self.velocity);
        self.angle = self.velocity.mul_add(dt, self.angle);
    }
}

// ---------------------------------------------------------------------------
// MockSimulator
// ---------------------------------------------------------------------------

/// Single-body mock engine.
#[derive(Clone, Debug)]
pub struct MockSimulator {
    joint_names: Vec<String>,
    time_step: f32,
    body: Option<BodyId>,
    joints: Vec<MockJoint>,
    pose: BasePose,
    velocity: BaseVelocity,
    dynamics: BTreeMap<LinkId, DynamicsInfo>,
    /// Number of successful `load_body` calls.
    pub loads: usize,
    /// Physics steps taken since construction.
    pub steps: u64,
    /// Every `set_joint_torques` call, in order.
    pub torque_log: Vec<Vec<f32>>,
    /// Every `set_dynamics_param` call, in order.
    pub param_log: Vec<(LinkId, DynamicsParam)>,
    /// Links whose default damping was cleared.
    pub cleared_damping: Vec<LinkId>,
    /// Pose the base is pinned to, if any.
    pub rack: Option<BasePose>,
}

impl MockSimulator {
    /// Engine whose bodies have the given joints, in index order.
    pub fn new(joint_names: Vec<String>) -> Self {
        Self {
            joint_names,
            time_step: 0.001,
            body: None,
            joints: Vec::new(),
            pose: BasePose::default(),
            velocity: BaseVelocity::default(),
            dynamics: BTreeMap::new(),
            loads: 0,
            steps: 0,
            torque_log: Vec::new(),
            param_log: Vec::new(),
            cleared_damping: Vec::new(),
            rack: None,
        }
    }

    /// Builder: physics step in seconds.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn with_time_step(mut self, time_step: f64) -> Self {
        self.time_step = time_step as f32;
        self
    }

    fn check_body(&self, body: BodyId) -> Result<(), SimError> {
        match self.body {
            Some(b) if b == body => Ok(()),
            _ => Err(SimError::BodyNotLoaded),
        }
    }

    fn joint_index(&self, joint: LinkId) -> Result<usize, SimError> {
        usize::try_from(joint)
            .ok()
            .filter(|&i| i < self.joints.len())
            .ok_or(SimError::UnknownLink(joint))
    }

    fn link_entry(&mut self, link: LinkId) -> Result<&mut DynamicsInfo, SimError> {
        self.dynamics.get_mut(&link).ok_or(SimError::UnknownLink(link))
    }

    // -- Inspection --

    pub fn joints(&self) -> &[MockJoint] {
        &self.joints
    }

    pub fn joint_by_name(&self, name: &str) -> Option<&MockJoint> {
        self.joints.iter().find(|j| j.name == name)
    }

    /// Move a joint directly, bypassing dynamics.
    pub fn set_joint(&mut self, joint: LinkId, angle: f32, velocity: f32) -> Result<(), SimError> {
        let i = self.joint_index(joint)?;
        self.joints[i].angle = angle;
        self.joints[i].velocity = velocity;
        Ok(())
    }

    /// Place the base directly.
    pub const fn set_base_state(&mut self, pose: BasePose, velocity: BaseVelocity) {
        self.pose = pose;
        self.velocity = velocity;
    }

    pub fn link_dynamics(&self, link: LinkId) -> Option<DynamicsInfo> {
        self.dynamics.get(&link).copied()
    }

    pub fn last_torques(&self) -> Option<&[f32]> {
        self.torque_log.last().map(Vec::as_slice)
    }
}

impl SimulatorLink for MockSimulator {
    fn load_body(&mut self, _source: BodySource<'_>, pose: BasePose) -> Result<BodyId, SimError> {
        let id = BodyId(u32::try_from(self.loads).unwrap_or(u32::MAX));
        self.body = Some(id);
        self.joints = self.joint_names.iter().cloned().map(MockJoint::new).collect();
        self.pose = pose;
        self.velocity = BaseVelocity::default();
        self.dynamics = (BASE_LINK..self.joint_count_i32())
            .map(|link| {
                (
                    link,
                    DynamicsInfo {
                        mass: default_link_mass(link),
                        local_inertia_diagonal: [0.1, 0.2, 0.3],
                        lateral_friction: 1.0,
                        restitution: 0.0,
                    },
                )
            })
            .collect();
        self.rack = None;
        self.loads += 1;
        Ok(id)
    }

    fn num_joints(&self, body: BodyId) -> Result<usize, SimError> {
        self.check_body(body)?;
        Ok(self.joints.len())
    }

    fn joint_info(&self, body: BodyId, index: usize) -> Result<JointInfo, SimError> {
        self.check_body(body)?;
        let joint = self
            .joints
            .get(index)
            .ok_or_else(|| SimError::UnknownJoint(format!("#{index}")))?;
        Ok(JointInfo {
            index: LinkId::try_from(index).map_err(|e| SimError::LinkFailure(e.to_string()))?,
            name: joint.name.clone(),
        })
    }

    fn joint_states(&self, body: BodyId, joints: &[LinkId]) -> Result<Vec<JointReading>, SimError> {
        self.check_body(body)?;
        joints
            .iter()
            .map(|&j| {
                let joint = &self.joints[self.joint_index(j)?];
                Ok::<_, SimError>(JointReading::new(joint.angle, joint.velocity))
            })
            .collect()
    }

    fn base_pose(&self, body: BodyId) -> Result<BasePose, SimError> {
        self.check_body(body)?;
        Ok(self.pose)
    }

    fn base_velocity(&self, body: BodyId) -> Result<BaseVelocity, SimError> {
        self.check_body(body)?;
        Ok(self.velocity)
    }

    fn set_joint_torques(
        &mut self,
        body: BodyId,
        joints: &[LinkId],
        torques: &[f32],
    ) -> Result<(), SimError> {
        self.check_body(body)?;
        if joints.len() != torques.len() {
            return Err(SimError::LinkFailure(format!(
                "{} joints but {} torques",
                joints.len(),
                torques.len()
            )));
        }
        for (&j, &t) in joints.iter().zip(torques) {
            let i = self.joint_index(j)?;
            self.joints[i].torque = t;
        }
        self.torque_log.push(torques.to_vec());
        Ok(())
    }

    fn set_dynamics_param(
        &mut self,
        body: BodyId,
        link: LinkId,
        param: DynamicsParam,
    ) -> Result<(), SimError> {
        self.check_body(body)?;
        let entry = self.link_entry(link)?;
        match param {
            DynamicsParam::Mass(m) => entry.mass = m,
            DynamicsParam::LocalInertiaDiagonal(i) => entry.local_inertia_diagonal = i,
            DynamicsParam::LateralFriction(f) => entry.lateral_friction = f,
            DynamicsParam::Restitution(r) => entry.restitution = r,
        }
        self.param_log.push((link, param));
        Ok(())
    }

    fn dynamics_info(&self, body: BodyId, link: LinkId) -> Result<DynamicsInfo, SimError> {
        self.check_body(body)?;
        self.dynamics
            .get(&link)
            .copied()
            .ok_or(SimError::UnknownLink(link))
    }

    fn set_joint_friction(
        &mut self,
        body: BodyId,
        joint: LinkId,
        friction: f32,
    ) -> Result<(), SimError> {
        self.check_body(body)?;
        let i = self.joint_index(joint)?;
        self.joints[i].friction = friction;
        Ok(())
    }

    fn clear_link_damping(&mut self, body: BodyId, link: LinkId) -> Result<(), SimError> {
        self.check_body(body)?;
        self.link_entry(link)?;
        self.cleared_damping.push(link);
        Ok(())
    }

    fn reset_base(
        &mut self,
        body: BodyId,
        pose: BasePose,
        velocity: BaseVelocity,
    ) -> Result<(), SimError> {
        self.check_body(body)?;
        self.pose = pose;
        self.velocity = velocity;
        Ok(())
    }

    fn reset_joint_state(
        &mut self,
        body: BodyId,
        joint: LinkId,
        angle: f32,
        velocity: f32,
    ) -> Result<(), SimError> {
        self.check_body(body)?;
        self.set_joint(joint, angle, velocity)
    }

    fn create_rack_constraint(&mut self, body: BodyId, pose: BasePose) -> Result<(), SimError> {
        self.check_body(body)?;
        self.rack = Some(pose);
        Ok(())
    }

    fn step_simulation(&mut self) -> Result<(), SimError> {
        let dt = self.time_step;
        for joint in &mut self.joints {
            joint.integrate(dt);
        }
        self.steps += 1;
        Ok(())
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "MockSimulator"
    }
}

impl MockSimulator {
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    fn joint_count_i32(&self) -> i32 {
        self.joints.len() as i32
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
