//! Butterworth low-pass filter applied to policy actions.
//!
//! Coefficients come from the bilinear transform with frequency pre-warping,
//! so the -3 dB point lands exactly on the cutoff. The filter runs once per
//! control step, at `1 / (time_step * action_repeat)` Hz.

use serde::{Deserialize, Serialize};
use strider_core::ConfigError;

const fn default_cutoff() -> f64 {
    4.0
}
const fn default_order() -> usize {
    2
}

/// Filter design parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Cutoff frequency in Hz (default: 4).
    #[serde(default = "default_cutoff")]
    pub cutoff_hz: f64,
    /// 1 or 2 (default: 2).
    #[serde(default = "default_order")]
    pub order: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            cutoff_hz: default_cutoff(),
            order: default_order(),
        }
    }
}

/// Normalized transfer function `b / a` with `a[0] == 1`.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Coefficients {
    b: [f64; 3],
    a: [f64; 3],
}

impl Coefficients {
    fn butterworth(order: usize, cutoff_hz: f64, sampling_hz: f64) -> Self {
        let k = (std::f64::consts::PI * cutoff_hz / sampling_hz).tan();
        match order {
            1 => {
                let norm = 1.0 / (1.0 + k);
                Self {
                    b: [k * norm, k * norm, 0.0],
                    a: [1.0, (k - 1.0) * norm, 0.0],
                }
            }
            _ => {
                let k2 = k * k;
                let sqrt2 = std::f64::consts::SQRT_2;
                let norm = 1.0 / (1.0 + sqrt2 * k + k2);
                let b0 = k2 * norm;
                Self {
                    b: [b0, 2.0 * b0, b0],
                    a: [1.0, 2.0 * (k2 - 1.0) * norm, (1.0 - sqrt2 * k + k2) * norm],
                }
            }
        }
    }
}

/// Per-joint taps: the last three inputs and last two outputs, newest first.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Taps {
    x: [f64; 3],
    y: [f64; 2],
}

/// Low-pass filter over one action vector per control step.
#[derive(Clone, Debug)]
pub struct ActionFilter {
    config: FilterConfig,
    coefficients: Coefficients,
    taps: Vec<Taps>,
}

impl ActionFilter {
    /// Design a filter for `num_joints` channels sampled at `sampling_hz`.
    pub fn new(config: FilterConfig, sampling_hz: f64, num_joints: usize) -> Result<Self, ConfigError> {
        Self::check(&config, sampling_hz)?;
        Ok(Self {
            coefficients: Coefficients::butterworth(config.order, config.cutoff_hz, sampling_hz),
            config,
            taps: vec![Taps::default(); num_joints],
        })
    }

    fn check(config: &FilterConfig, sampling_hz: f64) -> Result<(), ConfigError> {
        if !(1..=2).contains(&config.order) {
            return Err(ConfigError::invalid(
                "filter order",
                format!("must be 1 or 2, got {}", config.order),
            ));
        }
        if sampling_hz <= 0.0 {
            return Err(ConfigError::invalid("filter sampling rate", "must be positive"));
        }
        let nyquist = sampling_hz / 2.0;
        if config.cutoff_hz <= 0.0 || config.cutoff_hz >= nyquist {
            return Err(ConfigError::invalid(
                "filter cutoff",
                format!(
                    "{} Hz must lie in (0, {nyquist}) Hz for a {sampling_hz} Hz control rate",
                    config.cutoff_hz
                ),
            ));
        }
        Ok(())
    }

    /// Whether the filter can be redesigned for `sampling_hz`.
    pub fn check_sampling_rate(&self, sampling_hz: f64) -> Result<(), ConfigError> {
        Self::check(&self.config, sampling_hz)
    }

    /// Redesign for a new control rate, keeping the taps.
    pub fn set_sampling_rate(&mut self, sampling_hz: f64) -> Result<(), ConfigError> {
        Self::check(&self.config, sampling_hz)?;
        self.coefficients =
            Coefficients::butterworth(self.config.order, self.config.cutoff_hz, sampling_hz);
        Ok(())
    }

    pub const fn config(&self) -> FilterConfig {
        self.config
    }

    pub fn num_joints(&self) -> usize {
        self.taps.len()
    }

    /// Zero every tap.
    pub fn reset(&mut self) {
        self.taps.fill(Taps::default());
    }

    /// Fill every tap with `values`, as if the filter had been at rest there.
    pub fn init_history(&mut self, values: &[f32]) {
        for (taps, &v) in self.taps.iter_mut().zip(values) {
            let v = f64::from(v);
            taps.x = [v; 3];
            taps.y = [v; 2];
        }
    }

    /// Filter one action vector.
    #[allow(clippy::cast_possible_truncation)]
    pub fn filter(&mut self, action: &[f32]) -> Vec<f32> {
        let Coefficients { b, a } = self.coefficients;
        self.taps
            .iter_mut()
            .zip(action)
            .map(|(taps, &input)| {
                taps.x = [f64::from(input), taps.x[0], taps.x[1]];
                let y = b[0].mul_add(
                    taps.x[0],
                    b[1].mul_add(taps.x[1], b[2] * taps.x[2]),
                ) - a[1].mul_add(taps.y[0], a[2] * taps.y[1]);
                taps.y = [y, taps.y[0]];
                y as f32
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
