//! One legged robot driven through a [`SimulatorLink`].
//!
//! Per control step:
//!
//! ```text
//! action + init angles → filter → for each sub-step:
//!     interpolate → clamp → PD from delayed feedback → overheat check
//!     → set torques → advance physics → record observation
//! → sensors on_step → compose
//! ```

use std::collections::BTreeMap;
use std::fmt;

use nalgebra::UnitQuaternion;
use rand_chacha::ChaCha8Rng;
use strider_actuator_core::prelude::{
    ActionShaper, ControlMode, MotorModel, OverheatMonitor, clamp_hybrid_to_reference,
    clamp_to_reference, is_safe,
};
use strider_core::seed::{NOISE_STREAM, RANDOMIZER_STREAM};
use strider_core::{
    BasePose, BaseVelocity, BodyId, BodySource, ConfigError, DynamicsParam, JointReading, LinkId,
    RawObservation, RobotDescriptor, SeedHierarchy, SimulatorLink, StepClock, StriderError,
    ValidationError,
};
use strider_domain_rand::prelude::{
    EventSink, RandomizationSample, RandomizationTarget, Randomizer,
};
use strider_env::{ObservationHistory, SensorBounds, SensorComposer};
use strider_noise::prelude::ObservationNoise;
use tracing::{debug, info};

use crate::dynamics::{ModelDynamics, write_all, write_inertias, write_masses};
use crate::links::{JointClassifier, LinkLayout};
use crate::options::RobotOptions;
use crate::readings::{
    Readings, from_unit, quaternion_from_rpy, relative_orientation, roll_pitch_yaw,
    to_local_frame, to_unit,
};

/// Composed observation: sensor name to values, sorted by name.
pub type Observation = BTreeMap<String, Vec<f32>>;

/// Handles produced by loading the robot model.
struct LoadedBody {
    body: BodyId,
    links: LinkLayout,
    motor_ids: Vec<LinkId>,
    dynamics: ModelDynamics,
}

// ---------------------------------------------------------------------------
// LeggedRobot
// ---------------------------------------------------------------------------

/// A simulated legged robot described by a [`RobotDescriptor`].
pub struct LeggedRobot<S: SimulatorLink> {
    sim: S,
    descriptor: RobotDescriptor,
    options: RobotOptions,
    classifier: JointClassifier,

    body: BodyId,
    links: LinkLayout,
    motor_ids: Vec<LinkId>,
    model_dynamics: ModelDynamics,

    motor_model: MotorModel,
    overheat: OverheatMonitor,
    shaper: ActionShaper,
    history: ObservationHistory,
    composer: SensorComposer,
    noise: ObservationNoise,
    rng: ChaCha8Rng,
    randomizer: Option<Randomizer>,
    clock: StepClock,

    action_repeat: usize,
    control_latency: f64,
    pd_latency: f64,

    joint_states: Vec<JointReading>,
    base_position: [f32; 3],
    /// Relative to the initial orientation.
    base_orientation: [f32; 4],
    base_velocity: BaseVelocity,
    observed_torques: Vec<f32>,
    /// Joint-space torques sent on the last sub-step.
    applied_torques: Vec<f32>,
    last_action: Vec<f32>,
    readings: Readings,
}

impl<S: SimulatorLink> LeggedRobot<S> {
    /// Load the robot into `sim` and place it in its initial pose.
    ///
    /// Does not settle or randomize; call [`reset`](Self::reset) before the
    /// first episode.
    #[allow(clippy::cast_precision_loss)]
    pub fn new(
        mut sim: S,
        descriptor: RobotDescriptor,
        options: RobotOptions,
    ) -> Result<Self, StriderError> {
        descriptor.validate()?;
        options.validate(descriptor.num_motors)?;
        let n = descriptor.num_motors;

        let kp = descriptor.kp.expand("kp", n)?;
        let kd = descriptor.kd.expand("kd", n)?;
        let mut motor_model = MotorModel::new(
            &descriptor.joint_directions,
            &descriptor.joint_offsets,
            &kp,
            &kd,
            options.control_mode,
        )?
        .with_nominal_voltage(descriptor.nominal_voltage);
        if let Some(limits) = &descriptor.torque_limits {
            let limits = limits.expand("torque_limits", n)?;
            motor_model.set_torque_limits(Some(limits.as_slice()))?;
        }
        let overheat = OverheatMonitor::new(
            descriptor.overheat_torque,
            descriptor.overheat_time,
            descriptor.time_step,
        )?;
        let shaper = ActionShaper::new(options.shaper, 1.0 / descriptor.control_time_step(), n)?;
        let history = ObservationHistory::new(
            ObservationHistory::capacity_for(
                descriptor.control_latency.max(descriptor.pd_latency),
                descriptor.time_step,
            ),
            descriptor.time_step,
        );
        let noise = ObservationNoise::from_stdevs(descriptor.observation_noise_stdev)
            .map_err(|e| ConfigError::invalid("observation_noise_stdev", e.to_string()))?;

        let spec = options.resolve_randomization_spec()?;
        if let Some(repeat) = spec.max_action_repeat() {
            let control_hz = 1.0 / (descriptor.time_step * repeat as f64);
            shaper.check_control_rate(control_hz).map_err(|e| {
                ConfigError::invalid(
                    "control step",
                    format!("action repeat {repeat} is too slow for the action filter: {e}"),
                )
            })?;
        }

        let seeds = SeedHierarchy::new(options.seed);
        let randomizer = Randomizer::new(
            spec,
            seeds.subsystem_rng(options.instance, RANDOMIZER_STREAM),
        )
        .with_param_bounds(options.param_bounds)
        .with_seed(options.randomization_seed);

        let classifier = JointClassifier::new(&descriptor.joint_patterns)?;
        let loaded = Self::load_model(&mut sim, &descriptor, &options, &classifier)?;

        let mut robot = Self {
            sim,
            classifier,
            body: loaded.body,
            links: loaded.links,
            motor_ids: loaded.motor_ids,
            model_dynamics: loaded.dynamics,
            motor_model,
            overheat,
            shaper,
            history,
            composer: SensorComposer::new(),
            noise,
            rng: seeds.subsystem_rng(options.instance, NOISE_STREAM),
            randomizer: Some(randomizer),
            clock: StepClock::new(descriptor.time_step),
            action_repeat: descriptor.action_repeat,
            control_latency: descriptor.control_latency,
            pd_latency: descriptor.pd_latency,
            joint_states: vec![JointReading::default(); n],
            base_position: [0.0; 3],
            base_orientation: [0.0, 0.0, 0.0, 1.0],
            base_velocity: BaseVelocity::default(),
            observed_torques: vec![0.0; n],
            applied_torques: vec![0.0; n],
            last_action: vec![0.0; n],
            readings: Readings::zeros(n),
            descriptor,
            options,
        };

        robot.reset_pose()?;
        robot.receive_observation()?;
        for config in robot.options.sensors.clone() {
            robot.composer.register(config.build(), &robot.readings)?;
        }
        Ok(robot)
    }

    fn init_pose(descriptor: &RobotDescriptor, options: &RobotOptions) -> BasePose {
        BasePose {
            position: if options.on_rack {
                descriptor.init_rack_position
            } else {
                descriptor.init_position
            },
            orientation: descriptor.init_orientation,
        }
    }

    fn load_model(
        sim: &mut S,
        descriptor: &RobotDescriptor,
        options: &RobotOptions,
        classifier: &JointClassifier,
    ) -> Result<LoadedBody, StriderError> {
        let pose = Self::init_pose(descriptor, options);
        let body = sim.load_body(
            BodySource {
                model: &descriptor.model,
                self_collision: options.self_collision,
            },
            pose,
        )?;
        if options.on_rack {
            sim.create_rack_constraint(body, pose)?;
        }
        let links = LinkLayout::build(&*sim, body, classifier)?;
        for joint in links.joints() {
            sim.clear_link_damping(body, joint)?;
        }
        let motor_ids = links.ids_of(&descriptor.motor_names)?;
        let dynamics = ModelDynamics::record(&*sim, body, &links)?;
        info!(
            "strider-robot: loaded {} into {} ({} motors, {} chassis links, {} feet)",
            descriptor.name,
            sim.name(),
            motor_ids.len(),
            links.chassis.len(),
            links.foot.len()
        );
        Ok(LoadedBody {
            body,
            links,
            motor_ids,
            dynamics,
        })
    }

    /// Free every joint and move the motors to their initial angles.
    fn reset_pose(&mut self) -> Result<(), StriderError> {
        for joint in self.links.joints() {
            self.sim.set_joint_friction(self.body, joint, 0.0)?;
        }
        let targets = self
            .motor_model
            .motors()
            .iter()
            .zip(&self.descriptor.init_motor_angles)
            .map(|(m, &angle)| m.to_joint_angle(angle));
        for (&id, angle) in self.motor_ids.iter().zip(targets) {
            self.sim.reset_joint_state(self.body, id, angle, 0.0)?;
        }
        Ok(())
    }

    /// Base pose for a reset that keeps the body.
    fn soft_reset_pose(&self) -> BasePose {
        let init = Self::init_pose(&self.descriptor, &self.options);
        if !self.options.reset_at_current_position {
            return init;
        }
        let yaw = roll_pitch_yaw(self.base_orientation)[2];
        let heading = UnitQuaternion::from_euler_angles(0.0, 0.0, yaw);
        BasePose {
            position: [self.base_position[0], self.base_position[1], init.position[2]],
            orientation: from_unit(&(heading * to_unit(init.orientation))),
        }
    }

    // -- Episode --

    /// Start a new episode and return the first observation.
    ///
    /// With `reload_body` the model is loaded again, which drops every
    /// dynamics change; otherwise the body is moved back in place.
    pub fn reset(&mut self, reload_body: bool) -> Result<Observation, StriderError> {
        if reload_body {
            let loaded =
                Self::load_model(&mut self.sim, &self.descriptor, &self.options, &self.classifier)?;
            self.body = loaded.body;
            self.links = loaded.links;
            self.motor_ids = loaded.motor_ids;
            self.model_dynamics = loaded.dynamics;
        } else {
            let pose = self.soft_reset_pose();
            self.sim.reset_base(self.body, pose, BaseVelocity::default())?;
        }
        self.reset_pose()?;

        let n = self.num_motors();
        self.motor_model.reset();
        self.history.clear();
        self.clock.reset();
        self.shaper.reset();
        self.observed_torques = vec![0.0; n];
        self.set_last_action(vec![0.0; n]);

        self.settle()?;
        self.shaper.reset();
        self.composer.on_reset(&self.readings);
        if self.options.enable_randomizer {
            self.randomize()?;
        }
        debug!(
            "strider-robot: reset {} after {} settle steps",
            self.descriptor.name,
            self.clock.total_steps()
        );
        Ok(self.observation())
    }

    /// Hold the initial angles, then the default pose, in position mode.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn settle(&mut self) -> Result<(), StriderError> {
        self.receive_observation()?;
        if self.options.reset_time <= 0.0 {
            return Ok(());
        }
        let init = self.descriptor.init_motor_angles.clone();
        for _ in 0..self.options.settle_steps {
            self.step_internal(&init, Some(ControlMode::Position))?;
        }
        if let Some(pose) = self.options.default_motor_angles.clone() {
            let steps = (self.options.reset_time / self.descriptor.time_step) as usize;
            for _ in 0..steps {
                self.step_internal(&pose, Some(ControlMode::Position))?;
            }
        }
        Ok(())
    }

    fn randomize(&mut self) -> Result<(), StriderError> {
        let Some(mut randomizer) = self.randomizer.take() else {
            return Ok(());
        };
        let result = randomizer.randomize(self);
        self.randomizer = Some(randomizer);
        result
    }

    /// Run one control step.
    ///
    /// In position mode `action` holds one offset per motor from the initial
    /// angles and is shaped before reaching the motors. Other modes pass the
    /// command through unchanged on every sub-step.
    pub fn step(&mut self, action: &[f32]) -> Result<Observation, StriderError> {
        let mode = self.motor_model.mode();
        ValidationError::check_action(action, mode.command_len(self.num_motors()))?;

        if mode == ControlMode::Position {
            let target: Vec<f32> = action
                .iter()
                .zip(&self.descriptor.init_motor_angles)
                .map(|(a, init)| a + init)
                .collect();
            self.set_last_action(target.clone());
            let true_angles = self.true_motor_angles();
            let filtered = self.shaper.filter_target(&target, &true_angles);
            for i in 0..self.action_repeat {
                let true_angles = self.true_motor_angles();
                let command = self
                    .shaper
                    .substep(i, self.action_repeat, &filtered, &true_angles);
                self.step_internal(&command, None)?;
                self.clock.tick_policy();
            }
            self.shaper.finish_step(filtered);
        } else {
            self.set_last_action(action.to_vec());
            for _ in 0..self.action_repeat {
                self.step_internal(action, None)?;
                self.clock.tick_policy();
            }
        }

        self.composer.on_step(&self.readings);
        Ok(self.observation())
    }

    fn step_internal(
        &mut self,
        commands: &[f32],
        mode: Option<ControlMode>,
    ) -> Result<(), StriderError> {
        self.apply_action(commands, mode)?;
        self.sim.step_simulation()?;
        self.receive_observation()?;
        self.clock.tick();
        Ok(())
    }

    /// Convert motor commands to torques and send them to the simulator.
    ///
    /// Does not advance the simulation. `mode` overrides the configured
    /// control mode for this call.
    pub fn apply_action(
        &mut self,
        commands: &[f32],
        mode: Option<ControlMode>,
    ) -> Result<(), StriderError> {
        let mode = mode.unwrap_or_else(|| self.motor_model.mode());
        ValidationError::check_action(commands, mode.command_len(self.num_motors()))?;

        let mut commands = commands.to_vec();
        let max_step = self.descriptor.max_motor_angle_step;
        match mode {
            ControlMode::Position => {
                clamp_to_reference(&mut commands, &self.true_motor_angles(), max_step);
            }
            ControlMode::Hybrid => {
                clamp_hybrid_to_reference(&mut commands, &self.true_motor_angles(), max_step);
            }
            // Torque commands carry no angle.
            ControlMode::Torque => {}
        }
        let (q, qdot) = self.pd_feedback();
        let qdot_true = self.true_motor_velocities();
        let torques = self
            .motor_model
            .convert_to_torque(&commands, &q, &qdot, &qdot_true, Some(mode))?;

        if self.options.motor_overheat_protection {
            self.overheat
                .check(self.motor_model.motors_mut(), &torques.actual);
        }

        self.applied_torques = self
            .motor_model
            .motors()
            .iter()
            .zip(&torques.actual)
            .map(|(m, &t)| if m.enabled { m.flip(t) } else { 0.0 })
            .collect();
        self.observed_torques = torques.observed;
        self.sim
            .set_joint_torques(self.body, &self.motor_ids, &self.applied_torques)?;
        Ok(())
    }

    fn set_last_action(&mut self, action: Vec<f32>) {
        self.readings.last_action.clone_from(&action);
        self.last_action = action;
    }

    // -- Observation --

    fn receive_observation(&mut self) -> Result<(), StriderError> {
        self.joint_states = self.sim.joint_states(self.body, &self.motor_ids)?;
        let pose = self.sim.base_pose(self.body)?;
        self.base_velocity = self.sim.base_velocity(self.body)?;
        self.base_position = pose.position;
        self.base_orientation =
            relative_orientation(pose.orientation, self.descriptor.init_orientation);
        let observation = self.true_observation();
        self.history.record(observation);
        if let Some(delayed) = self.history.delayed(self.control_latency) {
            self.readings =
                Readings::observe(&delayed, &self.last_action, &self.noise, &mut self.rng);
        }
        Ok(())
    }

    /// Noise-free reading of the current state.
    pub fn true_observation(&self) -> RawObservation {
        RawObservation {
            motor_angles: self.true_motor_angles(),
            motor_velocities: self.true_motor_velocities(),
            motor_torques: self.observed_torques.clone(),
            base_orientation: self.base_orientation,
            base_rate: self.true_base_roll_pitch_yaw_rate(),
        }
    }

    /// Motor angles and velocities delayed by the PD latency.
    fn pd_feedback(&self) -> (Vec<f32>, Vec<f32>) {
        match self.history.delayed(self.pd_latency) {
            Some(obs) => (obs.motor_angles, obs.motor_velocities),
            None => (self.true_motor_angles(), self.true_motor_velocities()),
        }
    }

    /// Current composed observation.
    pub fn observation(&self) -> Observation {
        self.composer.compose(&self.readings)
    }

    /// Bounds of every sensor, sorted by name.
    pub fn observation_space(&self) -> BTreeMap<String, SensorBounds> {
        self.composer.space()
    }

    pub const fn composer(&self) -> &SensorComposer {
        &self.composer
    }

    /// Delayed, noisy readings sensors observe.
    pub const fn readings(&self) -> &Readings {
        &self.readings
    }

    pub const fn history(&self) -> &ObservationHistory {
        &self.history
    }

    // -- True state --

    /// Current motor angles in motor space, not wrapped.
    pub fn true_motor_angles(&self) -> Vec<f32> {
        self.motor_model
            .motors()
            .iter()
            .zip(&self.joint_states)
            .map(|(m, s)| m.to_motor_angle(s.angle))
            .collect()
    }

    pub fn true_motor_velocities(&self) -> Vec<f32> {
        self.motor_model
            .motors()
            .iter()
            .zip(&self.joint_states)
            .map(|(m, s)| m.flip(s.velocity))
            .collect()
    }

    /// Torques reported by the motor model on the last sub-step.
    pub fn true_motor_torques(&self) -> &[f32] {
        &self.observed_torques
    }

    /// Joint-space torques sent on the last sub-step; zero for disabled motors.
    pub fn applied_torques(&self) -> &[f32] {
        &self.applied_torques
    }

    /// Base orientation `[x, y, z, w]` relative to the initial orientation.
    pub const fn true_base_orientation(&self) -> [f32; 4] {
        self.base_orientation
    }

    pub fn true_base_roll_pitch_yaw(&self) -> [f32; 3] {
        roll_pitch_yaw(self.base_orientation)
    }

    /// Base angular rate in the base frame.
    pub fn true_base_roll_pitch_yaw_rate(&self) -> [f32; 3] {
        to_local_frame(self.base_velocity.angular, self.base_orientation)
    }

    pub const fn base_position(&self) -> [f32; 3] {
        self.base_position
    }

    /// World-frame linear velocity of the base.
    pub const fn base_velocity(&self) -> [f32; 3] {
        self.base_velocity.linear
    }

    // -- Observed state --

    /// Delayed, noisy motor angles wrapped to `[-π, π)`.
    pub fn motor_angles(&self) -> &[f32] {
        &self.readings.motor_angles
    }

    pub fn motor_velocities(&self) -> &[f32] {
        &self.readings.motor_velocities
    }

    pub fn motor_torques(&self) -> &[f32] {
        &self.readings.motor_torques
    }

    pub const fn base_roll_pitch_yaw(&self) -> [f32; 3] {
        self.readings.roll_pitch_yaw
    }

    pub const fn base_roll_pitch_yaw_rate(&self) -> [f32; 3] {
        self.readings.roll_pitch_yaw_rate
    }

    /// Delayed, noisy base orientation.
    pub fn base_orientation(&self) -> [f32; 4] {
        quaternion_from_rpy(self.readings.roll_pitch_yaw)
    }

    /// Energy spent over one control step, from observed torques and
    /// velocities.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn energy_consumption_per_step(&self) -> f32 {
        self.readings.power() * (self.descriptor.time_step * self.action_repeat as f64) as f32
    }

    // -- Bookkeeping --

    pub const fn sim(&self) -> &S {
        &self.sim
    }

    pub const fn sim_mut(&mut self) -> &mut S {
        &mut self.sim
    }

    pub const fn descriptor(&self) -> &RobotDescriptor {
        &self.descriptor
    }

    pub const fn options(&self) -> &RobotOptions {
        &self.options
    }

    pub const fn body(&self) -> BodyId {
        self.body
    }

    pub const fn links(&self) -> &LinkLayout {
        &self.links
    }

    pub fn motor_ids(&self) -> &[LinkId] {
        &self.motor_ids
    }

    pub fn foot_link_ids(&self) -> &[LinkId] {
        &self.links.foot
    }

    pub const fn model_dynamics(&self) -> &ModelDynamics {
        &self.model_dynamics
    }

    pub const fn motor_model(&self) -> &MotorModel {
        &self.motor_model
    }

    pub const fn num_motors(&self) -> usize {
        self.descriptor.num_motors
    }

    pub const fn clock(&self) -> &StepClock {
        &self.clock
    }

    /// Seconds of policy-driven simulation since the last reset.
    pub fn time_since_reset(&self) -> f64 {
        self.clock.time_since_reset()
    }

    /// False once any motor has been disabled this episode.
    pub fn is_safe(&self) -> bool {
        is_safe(self.motor_model.motors())
    }

    pub fn enabled_list(&self) -> Vec<bool> {
        self.motor_model.enabled_list()
    }

    /// Last absolute motor target commanded by the policy.
    pub fn last_action(&self) -> &[f32] {
        &self.last_action
    }

    pub const fn action_repeat(&self) -> usize {
        self.action_repeat
    }

    pub const fn control_latency(&self) -> f64 {
        self.control_latency
    }

    pub const fn pd_latency(&self) -> f64 {
        self.pd_latency
    }

    // -- Setters --

    /// Chassis link masses, base link first.
    pub fn set_base_masses(&mut self, masses: &[f32]) -> Result<(), StriderError> {
        write_masses(&mut self.sim, self.body, &self.links.chassis, masses, "base masses")
    }

    /// Leg link masses followed by motor link masses.
    pub fn set_leg_masses(&mut self, masses: &[f32]) -> Result<(), StriderError> {
        let links = self.links.leg_and_motor();
        write_masses(&mut self.sim, self.body, &links, masses, "leg masses")
    }

    pub fn set_base_inertias(&mut self, inertias: &[[f32; 3]]) -> Result<(), StriderError> {
        write_inertias(
            &mut self.sim,
            self.body,
            &self.links.chassis,
            inertias,
            "base inertias",
        )
    }

    pub fn set_leg_inertias(&mut self, inertias: &[[f32; 3]]) -> Result<(), StriderError> {
        let links = self.links.leg_and_motor();
        write_inertias(&mut self.sim, self.body, &links, inertias, "leg inertias")
    }

    /// Lateral friction shared by every foot link.
    pub fn set_foot_friction(&mut self, friction: f32) -> Result<(), StriderError> {
        write_all(
            &mut self.sim,
            self.body,
            &self.links.foot,
            DynamicsParam::LateralFriction(friction),
        )?;
        Ok(())
    }

    pub fn set_foot_restitution(&mut self, restitution: f32) -> Result<(), StriderError> {
        write_all(
            &mut self.sim,
            self.body,
            &self.links.foot,
            DynamicsParam::Restitution(restitution),
        )?;
        Ok(())
    }

    /// One dry friction per foot link joint.
    pub fn set_joint_frictions(&mut self, frictions: &[f32]) -> Result<(), StriderError> {
        ConfigError::check_len("joint frictions", self.links.foot.len(), frictions.len())?;
        for (&joint, &friction) in self.links.foot.iter().zip(frictions) {
            self.sim.set_joint_friction(self.body, joint, friction)?;
        }
        Ok(())
    }

    pub const fn set_battery_voltage(&mut self, volts: f32) {
        self.motor_model.set_voltage(volts);
    }

    pub const fn set_motor_viscous_damping(&mut self, damping: f32) {
        self.motor_model.set_viscous_damping(damping);
    }

    pub fn set_motor_strength_ratios(&mut self, ratios: &[f32]) -> Result<(), ConfigError> {
        self.motor_model.set_strength_ratios(ratios)
    }

    pub fn set_motor_strength_ratio(&mut self, ratio: f32) {
        self.motor_model.set_strength_ratio(ratio);
    }

    pub fn set_motor_gains(&mut self, kp: &[f32], kd: &[f32]) -> Result<(), ConfigError> {
        self.motor_model.set_gains(kp, kd)
    }

    pub fn set_torque_limits(&mut self, limits: Option<&[f32]>) -> Result<(), ConfigError> {
        self.motor_model.set_torque_limits(limits)
    }

    pub const fn set_control_mode(&mut self, mode: ControlMode) {
        self.motor_model.set_mode(mode);
    }

    /// Delay of the readings sensors see, in seconds.
    pub const fn set_control_latency(&mut self, latency: f64) {
        self.control_latency = latency;
    }

    /// Delay of the feedback used by the PD loop, in seconds.
    pub const fn set_pd_latency(&mut self, latency: f64) {
        self.pd_latency = latency;
    }

    /// Physics sub-steps per control step. Redesigns the action filter for
    /// the new control rate.
    #[allow(clippy::cast_precision_loss)]
    pub fn set_action_repeat(&mut self, repeat: usize) -> Result<(), ConfigError> {
        if repeat == 0 {
            return Err(ConfigError::invalid("action_repeat", "must be >= 1"));
        }
        self.shaper
            .set_control_rate(1.0 / (self.descriptor.time_step * repeat as f64))?;
        self.action_repeat = repeat;
        Ok(())
    }

    // -- Randomization --

    /// Copy of the last drawn or applied randomization sample.
    pub fn randomization_parameters(&self) -> RandomizationSample {
        self.randomizer
            .as_ref()
            .map_or_else(RandomizationSample::new, Randomizer::parameters)
    }

    /// Apply a stored sample now and keep it for replay.
    pub fn set_randomization_parameters(
        &mut self,
        sample: &RandomizationSample,
    ) -> Result<(), StriderError> {
        let Some(mut randomizer) = self.randomizer.take() else {
            return Ok(());
        };
        let result = randomizer.set_from_parameters(sample, self);
        self.randomizer = Some(randomizer);
        result
    }

    /// While suspended, resets replay the last sample instead of drawing.
    pub fn set_randomization_suspended(&mut self, suspended: bool) {
        if let Some(randomizer) = &mut self.randomizer {
            randomizer.set_suspended(suspended);
        }
    }

    /// Receive every randomization event.
    pub fn set_randomization_event_sink(&mut self, sink: EventSink) {
        self.randomizer = self.randomizer.take().map(|r| r.with_event_sink(sink));
    }

    pub const fn randomizer(&self) -> Option<&Randomizer> {
        self.randomizer.as_ref()
    }
}

// ---------------------------------------------------------------------------
// RandomizationTarget
// ---------------------------------------------------------------------------

impl<S: SimulatorLink> RandomizationTarget for LeggedRobot<S> {
    fn num_motors(&self) -> usize {
        self.descriptor.num_motors
    }

    fn num_legs(&self) -> usize {
        self.descriptor.num_legs()
    }

    fn num_knee_joints(&self) -> usize {
        self.links.foot.len()
    }

    fn base_masses_from_model(&self) -> Vec<f32> {
        self.model_dynamics.base_masses.clone()
    }

    fn leg_masses_from_model(&self) -> Vec<f32> {
        self.model_dynamics.leg_masses.clone()
    }

    fn base_inertias_from_model(&self) -> Vec<[f32; 3]> {
        self.model_dynamics.base_inertias.clone()
    }

    fn leg_inertias_from_model(&self) -> Vec<[f32; 3]> {
        self.model_dynamics.leg_inertias.clone()
    }

    fn set_base_masses(&mut self, masses: &[f32]) -> Result<(), StriderError> {
        Self::set_base_masses(self, masses)
    }

    fn set_leg_masses(&mut self, masses: &[f32]) -> Result<(), StriderError> {
        Self::set_leg_masses(self, masses)
    }

    fn set_base_inertias(&mut self, inertias: &[[f32; 3]]) -> Result<(), StriderError> {
        Self::set_base_inertias(self, inertias)
    }

    fn set_leg_inertias(&mut self, inertias: &[[f32; 3]]) -> Result<(), StriderError> {
        Self::set_leg_inertias(self, inertias)
    }

    fn set_control_latency(&mut self, latency: f64) {
        Self::set_control_latency(self, latency);
    }

    fn set_joint_frictions(&mut self, frictions: &[f32]) -> Result<(), StriderError> {
        Self::set_joint_frictions(self, frictions)
    }

    fn set_motor_viscous_damping(&mut self, damping: f32) {
        Self::set_motor_viscous_damping(self, damping);
    }

    fn set_foot_restitution(&mut self, restitution: f32) -> Result<(), StriderError> {
        Self::set_foot_restitution(self, restitution)
    }

    fn set_foot_friction(&mut self, friction: f32) -> Result<(), StriderError> {
        Self::set_foot_friction(self, friction)
    }

    fn set_battery_voltage(&mut self, volts: f32) {
        Self::set_battery_voltage(self, volts);
    }

    fn set_motor_strength_ratios(&mut self, ratios: &[f32]) -> Result<(), StriderError> {
        Ok(Self::set_motor_strength_ratios(self, ratios)?)
    }

    fn set_action_repeat(&mut self, repeat: usize) -> Result<(), StriderError> {
        Ok(Self::set_action_repeat(self, repeat)?)
    }
}

impl<S: SimulatorLink> fmt::Debug for LeggedRobot<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeggedRobot")
            .field("name", &self.descriptor.name)
            .field("simulator", &self.sim.name())
            .field("body", &self.body)
            .field("clock", &self.clock)
            .field("action_repeat", &self.action_repeat)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use strider_domain_rand::prelude::RandomizationSpec;
    use strider_test_utils::{MockSimulator, fast_laikago, mock_simulator};

    fn robot(options: RobotOptions) -> LeggedRobot<MockSimulator> {
        let d = fast_laikago();
        LeggedRobot::new(mock_simulator(&d), d, options).unwrap()
    }

    #[test]
    fn robot_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<LeggedRobot<MockSimulator>>();
    }

    #[test]
    fn construction_places_motors_at_init_angles() {
        let r = robot(RobotOptions::default());
        let init = &r.descriptor().init_motor_angles;
        for (a, b) in r.true_motor_angles().iter().zip(init) {
            assert!((a - b).abs() < 1e-6, "{a} vs {b}");
        }
        assert_eq!(r.sim().loads, 1);
        assert_eq!(r.sim().cleared_damping.len(), 16);
        assert_eq!(r.history().len(), 1);
    }

    #[test]
    fn rack_pins_base() {
        let r = robot(RobotOptions {
            on_rack: true,
            ..RobotOptions::default()
        });
        let rack = r.sim().rack.unwrap();
        assert_eq!(rack.position, r.descriptor().init_rack_position);
    }

    #[test]
    fn incompatible_options_fail_before_loading() {
        let d = fast_laikago();
        let sim = mock_simulator(&d);
        let err = LeggedRobot::new(
            sim,
            d,
            RobotOptions {
                on_rack: true,
                reset_at_current_position: true,
                ..RobotOptions::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, StriderError::Config(ConfigError::Incompatible(_))));
    }

    #[test]
    fn unknown_spec_name_fails() {
        let d = fast_laikago();
        let sim = mock_simulator(&d);
        let err = LeggedRobot::new(
            sim,
            d,
            RobotOptions {
                randomization_spec: "everything".into(),
                ..RobotOptions::default()
            },
        )
        .unwrap_err();
        assert!(matches!(
            err,
            StriderError::Config(ConfigError::UnknownRandomizationSpec(_))
        ));
    }

    fn with_control_step(low: f32, high: f32) -> RobotOptions {
        let ranges = format!("\"control step\" = [{low:?}, {high:?}]");
        RobotOptions {
            enable_randomizer: true,
            randomization_ranges: Some(RandomizationSpec::from_toml_str(&ranges).unwrap()),
            ..RobotOptions::default().without_settling()
        }
    }

    #[test]
    fn control_step_too_slow_for_filter_fails_at_construction() {
        // 40 sub-steps of 1/256 s give 6.4 Hz, below twice the 4 Hz cutoff.
        let d = fast_laikago();
        let sim = mock_simulator(&d);
        let err = LeggedRobot::new(sim, d, with_control_step(2.0, 40.0)).unwrap_err();
        assert!(matches!(
            err,
            StriderError::Config(ConfigError::InvalidValue { ref field, .. }) if field == "control step"
        ));
    }

    #[test]
    fn control_step_within_filter_range_randomizes() {
        let d = fast_laikago();
        let sim = mock_simulator(&d);
        let mut robot = LeggedRobot::new(sim, d, with_control_step(2.0, 8.9)).unwrap();
        for _ in 0..5 {
            robot.reset(false).unwrap();
            assert!((2..=8).contains(&robot.action_repeat()));
        }
    }

    #[test]
    fn duplicate_sensors_fail() {
        use crate::options::SensorConfig;
        let d = fast_laikago();
        let sim = mock_simulator(&d);
        let options = RobotOptions::default().with_sensors(vec![
            SensorConfig::LastAction { history: 0 },
            SensorConfig::LastAction { history: 0 },
        ]);
        assert!(LeggedRobot::new(sim, d, options).is_err());
    }

    #[test]
    fn debug_names_robot() {
        let r = robot(RobotOptions::default());
        let text = format!("{r:?}");
        assert!(text.contains("laikago"));
        assert!(text.contains("MockSimulator"));
    }
}
