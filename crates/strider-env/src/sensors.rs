//! Sensor variants and the capability every sensor exposes.
//!
//! Sensors read from a [`SensorSource`], the robot's per-step snapshot of
//! delayed and noisy readings. The closed [`Sensor`] enum dispatches to the
//! concrete variants.

use std::collections::VecDeque;
use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SensorSource
// ---------------------------------------------------------------------------

/// Readings a sensor may observe.
///
/// Angles are wrapped to `[-π, π)` and already delayed and noisy.
pub trait SensorSource {
    fn num_motors(&self) -> usize;

    /// Observed motor angles in motor space.
    fn motor_angles(&self) -> Vec<f32>;

    /// Observed base roll, pitch and yaw.
    fn base_roll_pitch_yaw(&self) -> [f32; 3];

    /// Observed base roll, pitch and yaw rates in the body frame.
    fn base_roll_pitch_yaw_rate(&self) -> [f32; 3];

    /// Last absolute motor target commanded by the policy.
    fn last_action(&self) -> Vec<f32>;
}

// ---------------------------------------------------------------------------
// SensorCapability
// ---------------------------------------------------------------------------

/// What every sensor exposes to the composer.
pub trait SensorCapability {
    /// Unique name within one composer.
    fn name(&self) -> &str;

    fn lower_bound(&self) -> Vec<f32>;

    fn upper_bound(&self) -> Vec<f32>;

    /// Current reading.
    fn observe(&self, source: &dyn SensorSource) -> Vec<f32>;

    /// Called once at registration.
    fn bind(&mut self, source: &dyn SensorSource);

    /// Called once per episode reset.
    fn on_reset(&mut self, _source: &dyn SensorSource) {}

    /// Called once per control step, before composition.
    fn on_step(&mut self, _source: &dyn SensorSource) {}

    fn dim(&self) -> usize {
        self.lower_bound().len()
    }
}

// ---------------------------------------------------------------------------
// MotorAngleSensor
// ---------------------------------------------------------------------------

/// Observed motor angles, bounded by `±π`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MotorAngleSensor {
    num_motors: usize,
}

impl MotorAngleSensor {
    pub const fn new() -> Self {
        Self { num_motors: 0 }
    }
}

impl SensorCapability for MotorAngleSensor {
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "MotorAngle"
    }

    fn lower_bound(&self) -> Vec<f32> {
        vec![-PI; self.num_motors]
    }

    fn upper_bound(&self) -> Vec<f32> {
        vec![PI; self.num_motors]
    }

    fn observe(&self, source: &dyn SensorSource) -> Vec<f32> {
        source.motor_angles()
    }

    fn bind(&mut self, source: &dyn SensorSource) {
        self.num_motors = source.num_motors();
    }
}

// ---------------------------------------------------------------------------
// ImuSensor
// ---------------------------------------------------------------------------

/// One IMU output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImuChannel {
    Roll,
    Pitch,
    Yaw,
    RollRate,
    PitchRate,
    YawRate,
}

impl ImuChannel {
    const fn bound(self) -> f32 {
        match self {
            Self::Roll | Self::Pitch | Self::Yaw => 2.0 * PI,
            Self::RollRate | Self::PitchRate | Self::YawRate => 2000.0 * PI,
        }
    }

    fn read(self, rpy: [f32; 3], rate: [f32; 3]) -> f32 {
        match self {
            Self::Roll => rpy[0],
            Self::Pitch => rpy[1],
            Self::Yaw => rpy[2],
            Self::RollRate => rate[0],
            Self::PitchRate => rate[1],
            Self::YawRate => rate[2],
        }
    }
}

/// Base orientation and angular rate.
#[derive(Clone, Debug, PartialEq)]
pub struct ImuSensor {
    channels: Vec<ImuChannel>,
}

impl ImuSensor {
    /// Roll, pitch and their rates.
    pub fn new() -> Self {
        Self::with_channels(vec![
            ImuChannel::Roll,
            ImuChannel::Pitch,
            ImuChannel::RollRate,
            ImuChannel::PitchRate,
        ])
    }

    pub const fn with_channels(channels: Vec<ImuChannel>) -> Self {
        Self { channels }
    }

    pub fn channels(&self) -> &[ImuChannel] {
        &self.channels
    }
}

impl Default for ImuSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorCapability for ImuSensor {
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "IMU"
    }

    fn lower_bound(&self) -> Vec<f32> {
        self.channels.iter().map(|c| -c.bound()).collect()
    }

    fn upper_bound(&self) -> Vec<f32> {
        self.channels.iter().map(|c| c.bound()).collect()
    }

    fn observe(&self, source: &dyn SensorSource) -> Vec<f32> {
        let rpy = source.base_roll_pitch_yaw();
        let rate = source.base_roll_pitch_yaw_rate();
        self.channels.iter().map(|c| c.read(rpy, rate)).collect()
    }

    fn bind(&mut self, _source: &dyn SensorSource) {}
}

// ---------------------------------------------------------------------------
// LastActionSensor
// ---------------------------------------------------------------------------

/// The last action commanded by the policy, bounded by `±2π`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LastActionSensor {
    num_motors: usize,
}

impl LastActionSensor {
    pub const fn new() -> Self {
        Self { num_motors: 0 }
    }
}

impl SensorCapability for LastActionSensor {
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "LastAction"
    }

    fn lower_bound(&self) -> Vec<f32> {
        vec![-2.0 * PI; self.num_motors]
    }

    fn upper_bound(&self) -> Vec<f32> {
        vec![2.0 * PI; self.num_motors]
    }

    fn observe(&self, source: &dyn SensorSource) -> Vec<f32> {
        source.last_action()
    }

    fn bind(&mut self, source: &dyn SensorSource) {
        self.num_motors = source.num_motors();
    }
}

// ---------------------------------------------------------------------------
// HistoricSensor
// ---------------------------------------------------------------------------

/// Default number of frames a [`HistoricSensor`] keeps.
pub const DEFAULT_NUM_HISTORY: usize = 3;

/// Stacks the last `num_history` readings of another sensor, newest first.
#[derive(Clone, Debug, PartialEq)]
pub struct HistoricSensor {
    inner: Box<Sensor>,
    name: String,
    num_history: usize,
    frames: VecDeque<Vec<f32>>,
}

impl HistoricSensor {
    pub fn new(inner: Sensor, num_history: usize) -> Self {
        let name = format!("{}History", inner.name());
        Self {
            inner: Box::new(inner),
            name,
            num_history: num_history.max(1),
            frames: VecDeque::new(),
        }
    }

    pub const fn num_history(&self) -> usize {
        self.num_history
    }

    pub fn inner(&self) -> &Sensor {
        &self.inner
    }

    fn repeat(&self, bound: &[f32]) -> Vec<f32> {
        bound
            .iter()
            .copied()
            .cycle()
            .take(bound.len() * self.num_history)
            .collect()
    }

    fn fill(&mut self, source: &dyn SensorSource) {
        let current = self.inner.observe(source);
        self.frames = std::iter::repeat_n(current, self.num_history).collect();
    }
}

impl SensorCapability for HistoricSensor {
    fn name(&self) -> &str {
        &self.name
    }

    fn lower_bound(&self) -> Vec<f32> {
        self.repeat(&self.inner.lower_bound())
    }

    fn upper_bound(&self) -> Vec<f32> {
        self.repeat(&self.inner.upper_bound())
    }

    fn observe(&self, source: &dyn SensorSource) -> Vec<f32> {
        if self.frames.is_empty() {
            let current = self.inner.observe(source);
            return self.repeat(&current);
        }
        self.frames.iter().flatten().copied().collect()
    }

    fn bind(&mut self, source: &dyn SensorSource) {
        self.inner.bind(source);
    }

    fn on_reset(&mut self, source: &dyn SensorSource) {
        self.inner.on_reset(source);
        self.fill(source);
    }

    fn on_step(&mut self, source: &dyn SensorSource) {
        self.inner.on_step(source);
        if self.frames.len() == self.num_history {
            self.frames.pop_back();
        }
        self.frames.push_front(self.inner.observe(source));
    }
}

// ---------------------------------------------------------------------------
// Sensor
// ---------------------------------------------------------------------------

/// Closed set of sensors a robot can carry.
#[derive(Clone, Debug, PartialEq)]
pub enum Sensor {
    MotorAngle(MotorAngleSensor),
    Imu(ImuSensor),
    LastAction(LastActionSensor),
    Historic(HistoricSensor),
}

impl Sensor {
    pub const fn motor_angle() -> Self {
        Self::MotorAngle(MotorAngleSensor::new())
    }

    pub fn imu(channels: Vec<ImuChannel>) -> Self {
        Self::Imu(ImuSensor::with_channels(channels))
    }

    pub const fn last_action() -> Self {
        Self::LastAction(LastActionSensor::new())
    }

    /// Wrap this sensor in a [`HistoricSensor`].
    pub fn historic(self, num_history: usize) -> Self {
        Self::Historic(HistoricSensor::new(self, num_history))
    }

    fn capability(&self) -> &dyn SensorCapability {
        match self {
            Self::MotorAngle(s) => s,
            Self::Imu(s) => s,
            Self::LastAction(s) => s,
            Self::Historic(s) => s,
        }
    }

    fn capability_mut(&mut self) -> &mut dyn SensorCapability {
        match self {
            Self::MotorAngle(s) => s,
            Self::Imu(s) => s,
            Self::LastAction(s) => s,
            Self::Historic(s) => s,
        }
    }
}

impl SensorCapability for Sensor {
    fn name(&self) -> &str {
        self.capability().name()
    }

    fn lower_bound(&self) -> Vec<f32> {
        self.capability().lower_bound()
    }

    fn upper_bound(&self) -> Vec<f32> {
        self.capability().upper_bound()
    }

    fn observe(&self, source: &dyn SensorSource) -> Vec<f32> {
        self.capability().observe(source)
    }

    fn bind(&mut self, source: &dyn SensorSource) {
        self.capability_mut().bind(source);
    }

    fn on_reset(&mut self, source: &dyn SensorSource) {
        self.capability_mut().on_reset(source);
    }

    fn on_step(&mut self, source: &dyn SensorSource) {
        self.capability_mut().on_step(source);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
