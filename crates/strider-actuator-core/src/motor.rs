//! Motor model: per-motor state and the command-to-torque conversion.
//!
//! Torque pipeline, per motor:
//!
//! ```text
//! command → control law → × voltage / nominal → − damping × q̇ → clamp ±limit → × strength
//! ```

use strider_core::{ConfigError, ValidationError};
use tracing::warn;

use crate::control::{ControlMode, HybridCommand, PdLaw};

// ---------------------------------------------------------------------------
// MotorState
// ---------------------------------------------------------------------------

/// State of one motor.
///
/// The safety monitor owns `enabled` and `overheat_counter`; everything else
/// is written by [`MotorModel`] setters.
#[derive(Clone, Debug, PartialEq)]
pub struct MotorState {
    /// Sign mapping joint space to motor space (+1 or -1).
    pub direction: f32,
    /// Joint-space angle at motor-space zero.
    pub offset: f32,
    pub kp: f32,
    pub kd: f32,
    pub torque_limit: Option<f32>,
    /// Multiplies the clamped torque, in `[0, 1]`.
    pub strength_ratio: f32,
    pub enabled: bool,
    /// Consecutive steps above the overheat threshold.
    pub overheat_counter: u32,
}

impl MotorState {
    pub const fn new(direction: f32, offset: f32, kp: f32, kd: f32) -> Self {
        Self {
            direction,
            offset,
            kp,
            kd,
            torque_limit: None,
            strength_ratio: 1.0,
            enabled: true,
            overheat_counter: 0,
        }
    }

    /// Joint-space angle to motor-space angle.
    pub fn to_motor_angle(&self, joint_angle: f32) -> f32 {
        (joint_angle - self.offset) * self.direction
    }

    /// Motor-space angle to joint-space angle.
    pub fn to_joint_angle(&self, motor_angle: f32) -> f32 {
        motor_angle.mul_add(self.direction, self.offset)
    }

    /// Joint-space rate or torque to motor space, and back.
    pub fn flip(&self, value: f32) -> f32 {
        value * self.direction
    }

    const fn pd(&self) -> PdLaw {
        PdLaw::new(self.kp, self.kd)
    }

    fn limit(&self, torque: f32) -> f32 {
        let clamped = match self.torque_limit {
            Some(limit) => torque.clamp(-limit, limit),
            None => torque,
        };
        clamped * self.strength_ratio
    }

    /// Clear safety state for a new episode.
    pub const fn reset(&mut self) {
        self.enabled = true;
        self.overheat_counter = 0;
    }
}

// ---------------------------------------------------------------------------
// TorqueOutput
// ---------------------------------------------------------------------------

/// Result of [`MotorModel::convert_to_torque`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TorqueOutput {
    /// Torque to apply, computed from delayed feedback.
    pub actual: Vec<f32>,
    /// Torque reported to the policy, computed from true velocity.
    pub observed: Vec<f32>,
}

// ---------------------------------------------------------------------------
// MotorModel
// ---------------------------------------------------------------------------

/// Converts motor commands to torques for a fixed set of motors.
#[derive(Clone, Debug)]
pub struct MotorModel {
    motors: Vec<MotorState>,
    mode: ControlMode,
    voltage: f32,
    nominal_voltage: f32,
    viscous_damping: f32,
}

impl MotorModel {
    /// Build from per-motor directions, offsets and gains.
    pub fn new(
        directions: &[f32],
        offsets: &[f32],
        kp: &[f32],
        kd: &[f32],
        mode: ControlMode,
    ) -> Result<Self, ConfigError> {
        let n = directions.len();
        ConfigError::check_len("joint_offsets", n, offsets.len())?;
        ConfigError::check_len("kp", n, kp.len())?;
        ConfigError::check_len("kd", n, kd.len())?;
        let motors = (0..n)
            .map(|i| MotorState::new(directions[i], offsets[i], kp[i], kd[i]))
            .collect();
        Ok(Self {
            motors,
            mode,
            voltage: 16.0,
            nominal_voltage: 16.0,
            viscous_damping: 0.0,
        })
    }

    /// Set the voltage at which torque is unscaled; also resets the battery
    /// voltage to it.
    #[must_use]
    pub const fn with_nominal_voltage(mut self, volts: f32) -> Self {
        self.nominal_voltage = volts;
        self.voltage = volts;
        self
    }

    pub fn with_torque_limits(mut self, limits: &[f32]) -> Result<Self, ConfigError> {
        self.set_torque_limits(Some(limits))?;
        Ok(self)
    }

    // -- Conversion --

    /// Convert commands to `(actual, observed)` torques in motor space.
    ///
    /// `q` and `qdot` are the delayed motor angles and velocities; `qdot_true`
    /// is the current velocity. `mode` overrides the model's default mode.
    pub fn convert_to_torque(
        &self,
        commands: &[f32],
        q: &[f32],
        qdot: &[f32],
        qdot_true: &[f32],
        mode: Option<ControlMode>,
    ) -> Result<TorqueOutput, ValidationError> {
        let mode = mode.unwrap_or(self.mode);
        let n = self.motors.len();
        for got in [q.len(), qdot.len(), qdot_true.len()] {
            if got != n {
                return Err(ValidationError::ActionDimMismatch { expected: n, got });
            }
        }
        let expected = mode.command_len(n);
        if commands.len() != expected {
            return Err(ValidationError::ActionDimMismatch {
                expected,
                got: commands.len(),
            });
        }

        let scale = self.voltage / self.nominal_voltage;
        let mut out = TorqueOutput {
            actual: Vec::with_capacity(n),
            observed: Vec::with_capacity(n),
        };
        for (i, motor) in self.motors.iter().enumerate() {
            let (actual, observed) = match mode {
                ControlMode::Position => {
                    let pd = motor.pd();
                    (
                        pd.hold(commands[i], q[i], qdot[i]),
                        pd.hold(commands[i], q[i], qdot_true[i]),
                    )
                }
                ControlMode::Torque => (commands[i], commands[i]),
                ControlMode::Hybrid => {
                    let c = HybridCommand::unpack(commands, i);
                    let pd = PdLaw::new(c.kp, c.kd);
                    (
                        pd.torque(c.angle, q[i], c.velocity, qdot[i]) + c.torque,
                        pd.torque(c.angle, q[i], c.velocity, qdot_true[i]) + c.torque,
                    )
                }
            };
            let damping = self.viscous_damping * qdot_true[i];
            out.actual.push(motor.limit(actual.mul_add(scale, -damping)));
            out.observed.push(motor.limit(observed.mul_add(scale, -damping)));
        }
        Ok(out)
    }

    // -- Accessors --

    pub fn num_motors(&self) -> usize {
        self.motors.len()
    }

    pub fn motors(&self) -> &[MotorState] {
        &self.motors
    }

    pub fn motors_mut(&mut self) -> &mut [MotorState] {
        &mut self.motors
    }

    pub const fn mode(&self) -> ControlMode {
        self.mode
    }

    pub const fn set_mode(&mut self, mode: ControlMode) {
        self.mode = mode;
    }

    pub const fn voltage(&self) -> f32 {
        self.voltage
    }

    pub const fn viscous_damping(&self) -> f32 {
        self.viscous_damping
    }

    pub fn kps(&self) -> Vec<f32> {
        self.motors.iter().map(|m| m.kp).collect()
    }

    pub fn kds(&self) -> Vec<f32> {
        self.motors.iter().map(|m| m.kd).collect()
    }

    pub fn strength_ratios(&self) -> Vec<f32> {
        self.motors.iter().map(|m| m.strength_ratio).collect()
    }

    pub fn torque_limits(&self) -> Vec<Option<f32>> {
        self.motors.iter().map(|m| m.torque_limit).collect()
    }

    pub fn enabled_list(&self) -> Vec<bool> {
        self.motors.iter().map(|m| m.enabled).collect()
    }

    // -- Setters --

    pub fn set_gains(&mut self, kp: &[f32], kd: &[f32]) -> Result<(), ConfigError> {
        let n = self.motors.len();
        ConfigError::check_len("kp", n, kp.len())?;
        ConfigError::check_len("kd", n, kd.len())?;
        for (m, (&p, &d)) in self.motors.iter_mut().zip(kp.iter().zip(kd)) {
            m.kp = p;
            m.kd = d;
        }
        Ok(())
    }

    /// Per-motor torque limits, or `None` to remove them.
    pub fn set_torque_limits(&mut self, limits: Option<&[f32]>) -> Result<(), ConfigError> {
        match limits {
            Some(limits) => {
                ConfigError::check_len("torque_limits", self.motors.len(), limits.len())?;
                if let Some(i) = limits.iter().position(|l| *l < 0.0) {
                    return Err(ConfigError::invalid(
                        "torque_limits",
                        format!("entry {i} is negative"),
                    ));
                }
                for (m, &l) in self.motors.iter_mut().zip(limits) {
                    m.torque_limit = Some(l);
                }
            }
            None => {
                for m in &mut self.motors {
                    m.torque_limit = None;
                }
            }
        }
        Ok(())
    }

    /// Per-motor strength ratios. Values outside `[0, 1]` are clamped.
    pub fn set_strength_ratios(&mut self, ratios: &[f32]) -> Result<(), ConfigError> {
        ConfigError::check_len("strength_ratios", self.motors.len(), ratios.len())?;
        for (i, (m, &r)) in self.motors.iter_mut().zip(ratios).enumerate() {
            let clamped = r.clamp(0.0, 1.0);
            if (clamped - r).abs() > f32::EPSILON {
                warn!("strider-actuator-core: strength ratio {r} of motor {i} clamped to {clamped}");
            }
            m.strength_ratio = clamped;
        }
        Ok(())
    }

    /// One strength ratio for every motor.
    pub fn set_strength_ratio(&mut self, ratio: f32) {
        let ratios = vec![ratio; self.motors.len()];
        // Length matches by construction.
        let _ = self.set_strength_ratios(&ratios);
    }

    pub const fn set_voltage(&mut self, volts: f32) {
        self.voltage = volts;
    }

    pub const fn set_viscous_damping(&mut self, damping: f32) {
        self.viscous_damping = damping;
    }

    /// Re-enable every motor and clear overheat streaks.
    pub fn reset(&mut self) {
        for m in &mut self.motors {
            m.reset();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
