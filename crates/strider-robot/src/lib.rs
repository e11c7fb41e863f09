//! Simulated legged robots over a [`SimulatorLink`](strider_core::SimulatorLink).
//!
//! A [`LeggedRobot`] owns its simulator link and runs the full control step:
//!
//! ```text
//! policy action → shaper → motor model → simulator
//!                                            ↓
//! observation ← sensors ← noise ← latency ← history
//! ```
//!
//! Robots differ only in their [`RobotDescriptor`](strider_core::RobotDescriptor);
//! per-instance switches live in [`RobotOptions`].
//!
//! # Example
//!
//! ```no_run
//! use strider_core::{SimulatorLink, StriderError, presets};
//! use strider_robot::prelude::*;
//!
//! fn run<S: SimulatorLink>(sim: S) -> Result<(), StriderError> {
//!     let mut robot = LeggedRobot::new(sim, presets::laikago(), RobotOptions::default())?;
//!     let obs = robot.reset(false)?;
//!     assert!(obs.contains_key("IMU"));
//!     let obs = robot.step(&[0.0; 12])?;
//!     println!("{:?} after {:.3}s", obs["MotorAngle"], robot.time_since_reset());
//!     Ok(())
//! }
//! ```

pub mod dynamics;
pub mod links;
pub mod options;
pub mod readings;
pub mod robot;

pub use links::{JointClassifier, LinkCategory, LinkLayout};
pub use options::{RobotOptions, SensorConfig};
pub use robot::{LeggedRobot, Observation};

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::dynamics::ModelDynamics;
    pub use crate::options::{RobotOptions, SensorConfig};
    pub use crate::readings::Readings;
    pub use crate::robot::{LeggedRobot, Observation};
    pub use strider_actuator_core::prelude::{ControlMode, ShaperConfig};
    pub use strider_domain_rand::prelude::{RandomizationEvent, RandomizationSample};
}
