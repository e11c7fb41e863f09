// strider-core: Errors, descriptors, shared types and the simulator link for Strider.

pub mod clock;
pub mod config;
pub mod error;
pub mod presets;
pub mod seed;
pub mod sim;
pub mod types;

pub use clock::StepClock;
pub use config::{JointPatterns, PerMotor, RobotDescriptor};
pub use error::{ConfigError, SimError, StriderError, ValidationError};
pub use seed::SeedHierarchy;
pub use sim::{BodySource, SimulatorLink};
pub use types::{
    BASE_LINK, BaseVelocity, BasePose, BodyId, DynamicsInfo, DynamicsParam, JointInfo,
    JointReading, LinkId, RawObservation,
};
