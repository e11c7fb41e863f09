//! Action shaping between the policy and the motor model.
//!
//! One control step holds a target for `action_repeat` physics sub-steps:
//!
//! ```text
//! target → low-pass filter (once) → interpolate per sub-step → clamp around true angles
//! ```

use serde::{Deserialize, Serialize};
use strider_core::ConfigError;

use crate::control::HYBRID_COMMAND_SIZE;
use crate::filter::{ActionFilter, FilterConfig};

const fn default_true() -> bool {
    true
}

/// Which shaping stages run.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShaperConfig {
    /// Ramp linearly from the previous target over the sub-steps.
    #[serde(default = "default_true")]
    pub interpolation: bool,
    /// Low-pass the target once per control step.
    #[serde(default = "default_true")]
    pub filter: bool,
    #[serde(default)]
    pub filter_config: FilterConfig,
}

impl Default for ShaperConfig {
    fn default() -> Self {
        Self {
            interpolation: true,
            filter: true,
            filter_config: FilterConfig::default(),
        }
    }
}

/// Per-episode shaping state for one robot.
#[derive(Clone, Debug)]
pub struct ActionShaper {
    interpolation: bool,
    filter: Option<ActionFilter>,
    /// Filtered target of the previous control step.
    previous: Option<Vec<f32>>,
    /// Filter taps seeded for this episode.
    primed: bool,
}

impl ActionShaper {
    /// `control_hz` is the policy rate, `1 / (time_step * action_repeat)`.
    pub fn new(config: ShaperConfig, control_hz: f64, num_motors: usize) -> Result<Self, ConfigError> {
        let filter = if config.filter {
            Some(ActionFilter::new(config.filter_config, control_hz, num_motors)?)
        } else {
            None
        };
        Ok(Self {
            interpolation: config.interpolation,
            filter,
            previous: None,
            primed: false,
        })
    }

    pub const fn interpolation_enabled(&self) -> bool {
        self.interpolation
    }

    pub const fn filter_enabled(&self) -> bool {
        self.filter.is_some()
    }

    /// Filtered target of the previous control step, if any this episode.
    pub fn previous(&self) -> Option<&[f32]> {
        self.previous.as_deref()
    }

    /// Redesign the filter for a new control rate.
    pub fn set_control_rate(&mut self, control_hz: f64) -> Result<(), ConfigError> {
        match &mut self.filter {
            Some(filter) => filter.set_sampling_rate(control_hz),
            None => Ok(()),
        }
    }

    /// Whether [`set_control_rate`](Self::set_control_rate) would accept
    /// `control_hz`.
    pub fn check_control_rate(&self, control_hz: f64) -> Result<(), ConfigError> {
        match &self.filter {
            Some(filter) => filter.check_sampling_rate(control_hz),
            None => Ok(()),
        }
    }

    /// Forget the previous target and zero the filter.
    pub fn reset(&mut self) {
        self.previous = None;
        self.primed = false;
        if let Some(filter) = &mut self.filter {
            filter.reset();
        }
    }

    /// Filter a control-step target.
    ///
    /// The first call of an episode seeds the filter with `true_angles` so the
    /// robot does not jerk toward zero.
    pub fn filter_target(&mut self, target: &[f32], true_angles: &[f32]) -> Vec<f32> {
        let Some(filter) = &mut self.filter else {
            return target.to_vec();
        };
        if !self.primed {
            filter.init_history(true_angles);
            self.primed = true;
        }
        filter.filter(target)
    }

    /// Command for sub-step `index` of `repeat`.
    ///
    /// Interpolates from the previous filtered target, or from `true_angles`
    /// on the first control step of an episode.
    #[allow(clippy::cast_precision_loss)]
    pub fn substep(&self, index: usize, repeat: usize, target: &[f32], true_angles: &[f32]) -> Vec<f32> {
        if !self.interpolation {
            return target.to_vec();
        }
        let from = self.previous.as_deref().unwrap_or(true_angles);
        let blend = (index + 1) as f32 / repeat.max(1) as f32;
        from.iter()
            .zip(target)
            .map(|(&p, &t)| blend.mul_add(t - p, p))
            .collect()
    }

    /// Remember this control step's filtered target.
    pub fn finish_step(&mut self, target: Vec<f32>) {
        self.previous = Some(target);
    }
}

/// Clamp each command to `reference ± max_step`.
pub fn clamp_to_reference(commands: &mut [f32], reference: &[f32], max_step: f32) {
    for (c, &r) in commands.iter_mut().zip(reference) {
        *c = c.clamp(r - max_step, r + max_step);
    }
}

/// Clamp the angle slot of each packed hybrid command to `reference ± max_step`.
///
/// Velocity, gains and feed-forward torque are left alone.
pub fn clamp_hybrid_to_reference(commands: &mut [f32], reference: &[f32], max_step: f32) {
    for (command, &r) in commands.chunks_exact_mut(HYBRID_COMMAND_SIZE).zip(reference) {
        command[0] = command[0].clamp(r - max_step, r + max_step);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
