//! Per-episode randomization of a robot's physical parameters.
//!
//! A [`RandomizationSpec`](configs::RandomizationSpec) names the parameters to
//! perturb and their physical ranges. The [`Randomizer`](randomizer::Randomizer)
//! draws normalized samples, maps them onto those ranges and writes them to a
//! [`RandomizationTarget`](target::RandomizationTarget).
//!
//! # Example
//!
//! ```
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//! use strider_domain_rand::prelude::*;
//!
//! let spec = RandomizationSpec::by_name("actuator_params").unwrap();
//! let randomizer = Randomizer::new(spec, ChaCha8Rng::seed_from_u64(0)).with_seed(Some(3));
//! assert_eq!(randomizer.spec().len(), 4);
//! assert!(randomizer.parameters().is_empty());
//! ```

pub mod configs;
pub mod events;
pub mod params;
pub mod randomizer;
pub mod ranges;
pub mod sample;
pub mod target;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        configs::{RandomizationSpec, SPEC_NAMES},
        events::{EventSink, RandomizationEvent},
        params::RandomizationParam,
        randomizer::Randomizer,
        ranges::{ParamBounds, ParamRange, RangeError},
        sample::{RandomizationSample, SampleValue},
        target::RandomizationTarget,
    };
}
