//! Shared test fixtures and utilities for Strider crates.
//!
//! Provides an in-memory simulator link, joint layouts matching the preset
//! robots, and deterministic RNG setup.

pub mod descriptors;
pub mod mocks;
pub mod rng;

// ---------------------------------------------------------------------------
// Re-exports for convenience
// ---------------------------------------------------------------------------

pub use descriptors::{fast_laikago, joint_names_for, mock_simulator};
pub use mocks::{MockJoint, MockSimulator};
pub use rng::{random_action, seeded_rng};
