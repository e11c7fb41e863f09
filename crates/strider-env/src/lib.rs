//! Sensing for simulated legged robots.
//!
//! Latency is simulated by interpolating over recorded history, and sensors
//! are composed into a name-keyed observation.

pub mod composer;
pub mod history;
pub mod sensors;

pub use composer::{SensorBounds, SensorComposer};
pub use history::{DEFAULT_HISTORY_CAPACITY, ObservationHistory};
pub use sensors::{
    DEFAULT_NUM_HISTORY, HistoricSensor, ImuChannel, ImuSensor, LastActionSensor,
    MotorAngleSensor, Sensor, SensorCapability, SensorSource,
};
