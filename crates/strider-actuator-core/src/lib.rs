//! Actuation for simulated legged robots.
//!
//! Pure signal processing with no simulator dependency. Turns policy targets
//! into joint torques:
//!
//! ```text
//! Target → Filter → Interpolate → Clamp → Control Law → Modifiers → Limit → Overheat
//!          (Butterworth)  (per sub-step)     (PD/torque/hybrid) (voltage, damping) (±limit × strength)
//! ```
//!
//! # Quick Start
//!
//! ```
//! use strider_actuator_core::prelude::*;
//!
//! let model = MotorModel::new(&[1.0], &[0.0], &[10.0], &[0.5], ControlMode::Position)
//!     .unwrap()
//!     .with_torque_limits(&[3.0])
//!     .unwrap();
//!
//! // Target 1 rad, at 0 rad and at rest: kp pulls hard, the limit caps it.
//! let out = model
//!     .convert_to_torque(&[1.0], &[0.0], &[0.0], &[0.0], None)
//!     .unwrap();
//! assert!((out.actual[0] - 3.0).abs() < f32::EPSILON);
//! ```

pub mod control;
pub mod filter;
pub mod motor;
pub mod safety;
pub mod shaper;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::control::{ControlMode, HYBRID_COMMAND_SIZE, HybridCommand, PdLaw};
    pub use crate::filter::{ActionFilter, FilterConfig};
    pub use crate::motor::{MotorModel, MotorState, TorqueOutput};
    pub use crate::safety::{OverheatMonitor, is_safe};
    pub use crate::shaper::{
        ActionShaper, ShaperConfig, clamp_hybrid_to_reference, clamp_to_reference,
    };
}
