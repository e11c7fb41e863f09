//! Noise models for simulated robot readings.
//!
//! `strider-noise` provides zero-mean Gaussian noise and the per-channel
//! observation noise applied to delayed robot readings. All sampling takes
//! an explicit RNG for deterministic, reproducible simulations.
//!
//! # Quick Start
//!
//! ```
//! use strider_noise::prelude::*;
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//! let noise = ObservationNoise::from_stdevs([0.01, 0.0, 0.0, 0.0, 0.0]).unwrap();
//! let mut angles = [0.1_f32, -0.2];
//! noise.apply(NoiseChannel::MotorAngle, &mut angles, &mut rng);
//! ```

pub mod channels;
pub mod model;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::channels::{NoiseChannel, ObservationNoise};
    pub use crate::model::{NoiseError, NoiseModel};
}
