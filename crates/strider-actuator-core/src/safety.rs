//! Overheat protection.
//!
//! Each motor counts consecutive steps with `|torque| > threshold`. A step at
//! or below the threshold resets the count. Once the count exceeds
//! `time_limit / step` the motor is disabled until the next full reset.

use strider_core::ConfigError;
use tracing::warn;

use crate::motor::MotorState;

/// Per-motor overheat state machine driver.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverheatMonitor {
    threshold: f32,
    /// Streak length, in steps, that must be exceeded to trip.
    limit: f64,
}

impl OverheatMonitor {
    /// `threshold` in Nm, `time_limit` and `step` in seconds.
    pub fn new(threshold: f32, time_limit: f64, step: f64) -> Result<Self, ConfigError> {
        if step <= 0.0 {
            return Err(ConfigError::invalid("time_step", "must be positive"));
        }
        if time_limit <= 0.0 {
            return Err(ConfigError::invalid("overheat_time", "must be positive"));
        }
        Ok(Self {
            threshold,
            limit: time_limit / step,
        })
    }

    pub const fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Streak length that must be exceeded to trip. Not rounded.
    pub const fn limit(&self) -> f64 {
        self.limit
    }

    /// Update streaks from this step's torques and disable motors that trip.
    ///
    /// Returns the indices of motors disabled by this call.
    pub fn check(&self, motors: &mut [MotorState], torques: &[f32]) -> Vec<usize> {
        let mut tripped = Vec::new();
        for (i, (motor, &torque)) in motors.iter_mut().zip(torques).enumerate() {
            if torque.abs() > self.threshold {
                motor.overheat_counter = motor.overheat_counter.saturating_add(1);
            } else {
                motor.overheat_counter = 0;
            }
            if motor.enabled && f64::from(motor.overheat_counter) > self.limit {
                motor.enabled = false;
                warn!(
                    "strider-actuator-core: motor {i} overheated after {} steps above {} Nm",
                    motor.overheat_counter, self.threshold
                );
                tripped.push(i);
            }
        }
        tripped
    }
}

/// Whether any motor has tripped this episode.
pub fn is_safe(motors: &[MotorState]) -> bool {
    motors.iter().all(|m| m.enabled)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn motors(n: usize) -> Vec<MotorState> {
        vec![MotorState::new(1.0, 0.0, 1.0, 0.0); n]
    }

    #[test]
    fn limit_is_not_rounded() {
        let m = OverheatMonitor::new(1.0, 0.01, 0.004).unwrap();
        assert!((m.limit() - 2.5).abs() < 1e-9);
        let m = OverheatMonitor::new(1.0, 1.0, 0.25).unwrap();
        assert!((m.limit() - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn fractional_limit_trips_on_first_count_above_it() {
        // 0.01 / 0.004 = 2.5, so the third hot step trips.
        let monitor = OverheatMonitor::new(1.0, 0.01, 0.004).unwrap();
        let mut m = motors(1);
        for _ in 0..2 {
            assert!(monitor.check(&mut m, &[2.0]).is_empty());
        }
        assert!(m[0].enabled);
        assert_eq!(monitor.check(&mut m, &[2.0]), vec![0]);
        assert_eq!(m[0].overheat_counter, 3);
        assert!(!m[0].enabled);
    }

    #[test]
    fn trips_after_streak_exceeds_limit() {
        // 1.0 / 0.25 = 4, so the fifth consecutive hot step trips.
        let monitor = OverheatMonitor::new(2.0, 1.0, 0.25).unwrap();
        let mut m = motors(1);
        for _ in 0..4 {
            assert!(monitor.check(&mut m, &[3.0]).is_empty());
            assert!(m[0].enabled);
        }
        assert_eq!(monitor.check(&mut m, &[3.0]), vec![0]);
        assert!(!m[0].enabled);
        assert!(!is_safe(&m));
    }

    #[test]
    fn cool_step_resets_streak() {
        let monitor = OverheatMonitor::new(2.0, 1.0, 0.25).unwrap();
        let mut m = motors(1);
        for _ in 0..4 {
            monitor.check(&mut m, &[-3.0]);
        }
        assert_eq!(m[0].overheat_counter, 4);
        monitor.check(&mut m, &[2.0]);
        assert_eq!(m[0].overheat_counter, 0);
        for _ in 0..4 {
            monitor.check(&mut m, &[3.0]);
        }
        assert!(m[0].enabled);
    }

    #[test]
    fn overheated_is_terminal_until_reset() {
        let monitor = OverheatMonitor::new(1.0, 0.5, 0.25).unwrap();
        let mut m = motors(2);
        for _ in 0..3 {
            monitor.check(&mut m, &[5.0, 0.0]);
        }
        assert!(!m[0].enabled);
        assert!(m[1].enabled);
        for _ in 0..10 {
            assert!(monitor.check(&mut m, &[0.0, 0.0]).is_empty());
        }
        assert!(!m[0].enabled);
        m[0].reset();
        assert!(m[0].enabled);
        assert!(is_safe(&m));
    }

    #[test]
    fn rejects_non_positive_durations() {
        assert!(OverheatMonitor::new(1.0, 0.0, 0.001).is_err());
        assert!(OverheatMonitor::new(1.0, 1.0, 0.0).is_err());
    }
}
