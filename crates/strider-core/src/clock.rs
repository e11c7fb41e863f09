use std::fmt;

// ---------------------------------------------------------------------------
// StepClock
// ---------------------------------------------------------------------------

/// Integer step counter for one robot.
///
/// Time is derived from counts and the physics step rather than accumulated
/// as a float, so `time_since_reset` is exact for any number of steps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepClock {
    time_step: f64,
    /// Physics sub-steps taken by the policy since the last reset.
    policy_steps: u64,
    /// Every physics sub-step since the last reset, settling included.
    total_steps: u64,
}

impl StepClock {
    /// Create a clock with the given physics step in seconds.
    #[must_use]
    pub const fn new(time_step: f64) -> Self {
        Self {
            time_step,
            policy_steps: 0,
            total_steps: 0,
        }
    }

    #[must_use]
    pub const fn time_step(&self) -> f64 {
        self.time_step
    }

    pub const fn set_time_step(&mut self, time_step: f64) {
        self.time_step = time_step;
    }

    /// Count one physics sub-step of any kind.
    pub const fn tick(&mut self) {
        self.total_steps = self.total_steps.saturating_add(1);
    }

    /// Count one physics sub-step driven by a policy action.
    pub const fn tick_policy(&mut self) {
        self.policy_steps = self.policy_steps.saturating_add(1);
    }

    #[must_use]
    pub const fn policy_steps(&self) -> u64 {
        self.policy_steps
    }

    #[must_use]
    pub const fn total_steps(&self) -> u64 {
        self.total_steps
    }

    /// True before the first policy sub-step of an episode.
    #[must_use]
    pub const fn at_episode_start(&self) -> bool {
        self.policy_steps == 0
    }

    /// Seconds of policy-driven simulation since the last reset.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn time_since_reset(&self) -> f64 {
        self.policy_steps as f64 * self.time_step
    }

    /// Seconds of simulation since the last reset, settling included.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn total_time(&self) -> f64 {
        self.total_steps as f64 * self.time_step
    }

    pub const fn reset(&mut self) {
        self.policy_steps = 0;
        self.total_steps = 0;
    }
}

impl fmt::Display for StepClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} steps ({:.3}s)",
            self.policy_steps,
            self.time_since_reset()
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
