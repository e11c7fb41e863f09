//! Composes sensor readings into one observation.
//!
//! Sensors are kept in registration order for lifecycle hooks, while the
//! composed observation and the observation space are keyed and sorted by
//! sensor name so the output never depends on registration order.

use std::collections::BTreeMap;

use strider_core::ConfigError;
use tracing::debug;

use crate::sensors::{Sensor, SensorCapability, SensorSource};

/// Lower and upper bounds of one sensor.
pub type SensorBounds = (Vec<f32>, Vec<f32>);

// ---------------------------------------------------------------------------
// SensorComposer
// ---------------------------------------------------------------------------

/// Ordered set of sensors owned by one robot.
#[derive(Clone, Debug, Default)]
pub struct SensorComposer {
    sensors: Vec<Sensor>,
}

impl SensorComposer {
    pub const fn new() -> Self {
        Self {
            sensors: Vec::new(),
        }
    }

    /// Bind and register a sensor. Names must be unique.
    pub fn register(&mut self, mut sensor: Sensor, source: &dyn SensorSource) -> Result<(), ConfigError> {
        if self.sensors.iter().any(|s| s.name() == sensor.name()) {
            return Err(ConfigError::invalid(
                "sensors",
                format!("duplicate sensor name {}", sensor.name()),
            ));
        }
        sensor.bind(source);
        debug!(
            "strider-env: registered sensor {} ({} values)",
            sensor.name(),
            sensor.dim()
        );
        self.sensors.push(sensor);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    /// Sensors in registration order.
    pub fn sensors(&self) -> &[Sensor] {
        &self.sensors
    }

    pub fn get(&self, name: &str) -> Option<&Sensor> {
        self.sensors.iter().find(|s| s.name() == name)
    }

    /// Reading of every sensor, sorted by name.
    pub fn compose(&self, source: &dyn SensorSource) -> BTreeMap<String, Vec<f32>> {
        self.sensors
            .iter()
            .map(|s| (s.name().to_owned(), s.observe(source)))
            .collect()
    }

    /// Composed readings concatenated in name order.
    pub fn compose_flat(&self, source: &dyn SensorSource) -> Vec<f32> {
        self.compose(source).into_values().flatten().collect()
    }

    /// Bounds of every sensor, sorted by name.
    pub fn space(&self) -> BTreeMap<String, SensorBounds> {
        self.sensors
            .iter()
            .map(|s| (s.name().to_owned(), (s.lower_bound(), s.upper_bound())))
            .collect()
    }

    /// Total number of observation values.
    pub fn observation_dim(&self) -> usize {
        self.sensors.iter().map(SensorCapability::dim).sum()
    }

    /// Per-step hook, in registration order.
    pub fn on_step(&mut self, source: &dyn SensorSource) {
        for sensor in &mut self.sensors {
            sensor.on_step(source);
        }
    }

    /// Per-reset hook, in registration order.
    pub fn on_reset(&mut self, source: &dyn SensorSource) {
        for sensor in &mut self.sensors {
            sensor.on_reset(source);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::tests::FixedSource;
    use crate::sensors::ImuChannel;

    fn source() -> FixedSource {
        FixedSource {
            angles: vec![0.1, 0.2],
            rpy: [1.0, 2.0, 3.0],
            rate: [4.0, 5.0, 6.0],
            action: vec![0.3, 0.4],
        }
    }

    #[test]
    fn compose_sorted_by_name() {
        let src = source();
        let mut a = SensorComposer::new();
        a.register(Sensor::motor_angle(), &src).unwrap();
        a.register(Sensor::imu(vec![ImuChannel::Roll]), &src).unwrap();
        a.register(Sensor::last_action(), &src).unwrap();

        let mut b = SensorComposer::new();
        b.register(Sensor::last_action(), &src).unwrap();
        b.register(Sensor::imu(vec![ImuChannel::Roll]), &src).unwrap();
        b.register(Sensor::motor_angle(), &src).unwrap();

        let names: Vec<_> = a.compose(&src).into_keys().collect();
        assert_eq!(names, vec!["IMU", "LastAction", "MotorAngle"]);
        assert_eq!(a.compose(&src), b.compose(&src));
        assert_eq!(a.compose_flat(&src), vec![1.0, 0.3, 0.4, 0.1, 0.2]);
    }

    #[test]
    fn duplicate_names_rejected() {
        let src = source();
        let mut c = SensorComposer::new();
        c.register(Sensor::motor_angle(), &src).unwrap();
        let err = c.register(Sensor::motor_angle(), &src).unwrap_err();
        assert!(err.to_string().contains("MotorAngle"));
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn space_matches_dims() {
        let src = source();
        let mut c = SensorComposer::new();
        c.register(Sensor::motor_angle(), &src).unwrap();
        c.register(Sensor::motor_angle().historic(3), &src).unwrap();
        let space = c.space();
        assert_eq!(space["MotorAngle"].0.len(), 2);
        assert_eq!(space["MotorAngleHistory"].1.len(), 6);
        assert_eq!(c.observation_dim(), 8);
    }

    #[test]
    fn hooks_reach_every_sensor() {
        let mut src = source();
        let mut c = SensorComposer::new();
        c.register(Sensor::motor_angle().historic(2), &src).unwrap();
        c.on_reset(&src);
        src.angles = vec![9.0, 9.0];
        c.on_step(&src);
        let obs = c.compose(&src);
        assert_eq!(obs["MotorAngleHistory"], vec![9.0, 9.0, 0.1, 0.2]);
    }

    #[test]
    fn lookup_by_name() {
        let src = source();
        let mut c = SensorComposer::new();
        c.register(Sensor::last_action(), &src).unwrap();
        assert!(c.get("LastAction").is_some());
        assert!(c.get("IMU").is_none());
    }
}
