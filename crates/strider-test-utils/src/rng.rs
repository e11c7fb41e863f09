//! Deterministic RNG utilities for reproducible tests.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Create a deterministic `ChaCha8Rng` from a seed.
pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Policy action of `num_motors` offsets drawn uniformly in
/// `[-amplitude, amplitude)`.
pub fn random_action(num_motors: usize, amplitude: f32, seed: u64) -> Vec<f32> {
    let mut rng = seeded_rng(seed);
    (0..num_motors)
        .map(|_| rng.gen_range(-amplitude..amplitude))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
