//! Bounded history of raw observations for simulated latency.
//!
//! One entry is recorded per physics step, newest at index 0. A delayed
//! reading interpolates between the two entries bracketing the requested lag
//! and saturates at the oldest entry when the lag exceeds the history.

use std::collections::VecDeque;

use strider_core::RawObservation;

/// Default number of retained physics steps.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

// ---------------------------------------------------------------------------
// ObservationHistory
// ---------------------------------------------------------------------------

/// Ring buffer of [`RawObservation`]s, newest first.
#[derive(Clone, Debug)]
pub struct ObservationHistory {
    entries: VecDeque<RawObservation>,
    capacity: usize,
    /// Seconds between consecutive entries.
    step_duration: f64,
}

impl ObservationHistory {
    /// Create an empty history. A capacity of zero is raised to one.
    pub fn new(capacity: usize, step_duration: f64) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            step_duration,
        }
    }

    /// Capacity large enough to delay by `max_latency`.
    ///
    /// Returns at least [`DEFAULT_HISTORY_CAPACITY`].
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn capacity_for(max_latency: f64, step_duration: f64) -> usize {
        if step_duration <= 0.0 || max_latency <= 0.0 {
            return DEFAULT_HISTORY_CAPACITY;
        }
        let needed = (max_latency / step_duration).ceil() as usize + 2;
        needed.max(DEFAULT_HISTORY_CAPACITY)
    }

    /// Push a new observation, evicting the oldest at capacity.
    pub fn record(&mut self, observation: RawObservation) {
        if self.entries.len() == self.capacity {
            self.entries.pop_back();
        }
        self.entries.push_front(observation);
    }

    /// Observation as it looked `latency` seconds ago.
    ///
    /// Returns `None` only while the history is empty.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn delayed(&self, latency: f64) -> Option<RawObservation> {
        let newest = self.entries.front()?;
        if latency <= 0.0 || self.entries.len() == 1 || self.step_duration <= 0.0 {
            return Some(newest.clone());
        }
        let n = (latency / self.step_duration).floor() as usize;
        if n + 1 >= self.entries.len() {
            return self.entries.back().cloned();
        }
        let blend = (latency - n as f64 * self.step_duration) / self.step_duration;
        Some(self.entries[n].lerp(&self.entries[n + 1], blend as f32))
    }

    /// Drop every entry; capacity is kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn newest(&self) -> Option<&RawObservation> {
        self.entries.front()
    }

    pub fn oldest(&self) -> Option<&RawObservation> {
        self.entries.back()
    }

    /// Entry `index` steps back from the newest.
    pub fn get(&self, index: usize) -> Option<&RawObservation> {
        self.entries.get(index)
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    pub const fn step_duration(&self) -> f64 {
        self.step_duration
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn obs(v: f32) -> RawObservation {
        let mut o = RawObservation::zeros(1);
        o.motor_angles[0] = v;
        o.motor_velocities[0] = -v;
        o
    }

    /// History holding `values` newest first.
    fn filled(values: &[f32], capacity: usize, step: f64) -> ObservationHistory {
        let mut h = ObservationHistory::new(capacity, step);
        for &v in values.iter().rev() {
            h.record(obs(v));
        }
        h
    }

    #[test]
    fn empty_history_has_no_reading() {
        let h = ObservationHistory::new(4, 0.01);
        assert!(h.delayed(0.0).is_none());
        assert!(h.is_empty());
    }

    #[test]
    fn non_positive_latency_returns_newest() {
        let h = filled(&[4.0, 3.0, 2.0], 5, 0.25);
        for latency in [0.0, -1.0] {
            assert_relative_eq!(h.delayed(latency).unwrap().motor_angles[0], 4.0);
        }
    }

    #[test]
    fn single_entry_returned_for_any_latency() {
        let h = filled(&[7.0], 5, 0.25);
        assert_relative_eq!(h.delayed(10.0).unwrap().motor_angles[0], 7.0);
    }

    #[test]
    fn exact_multiple_returns_entry_without_blend() {
        let h = filled(&[4.0, 3.0, 2.0, 1.0, 0.0], 5, 0.25);
        for k in 0..4 {
            let got = h.delayed(0.25 * k as f64).unwrap();
            assert_eq!(got, h.get(k).unwrap().clone());
        }
    }

    #[test]
    fn interpolates_between_bracketing_entries() {
        // o4..o0 newest first, step 0.01; 0.025 sits halfway between o2 and o3.
        let h = filled(&[4.0, 3.0, 2.0, 1.0, 0.0], 5, 0.01);
        let got = h.delayed(0.025).unwrap();
        assert_relative_eq!(got.motor_angles[0], 1.5, epsilon = 1e-5);
        assert_relative_eq!(got.motor_velocities[0], -1.5, epsilon = 1e-5);
    }

    #[test]
    fn saturates_at_oldest() {
        let h = filled(&[4.0, 3.0, 2.0], 5, 0.25);
        assert_relative_eq!(h.delayed(0.5).unwrap().motor_angles[0], 2.0);
        assert_relative_eq!(h.delayed(100.0).unwrap().motor_angles[0], 2.0);
    }

    #[test]
    fn record_evicts_oldest_at_capacity() {
        let mut h = filled(&[2.0, 1.0, 0.0], 3, 0.25);
        h.record(obs(3.0));
        assert_eq!(h.len(), 3);
        assert_relative_eq!(h.newest().unwrap().motor_angles[0], 3.0);
        assert_relative_eq!(h.oldest().unwrap().motor_angles[0], 1.0);
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut h = filled(&[1.0, 0.0], 8, 0.25);
        h.clear();
        assert!(h.is_empty());
        assert_eq!(h.capacity(), 8);
    }

    #[test]
    fn capacity_for_long_latency() {
        assert_eq!(ObservationHistory::capacity_for(0.01, 0.001), 100);
        assert_eq!(ObservationHistory::capacity_for(0.5, 0.001), 502);
    }

    #[test]
    fn step_duration_sets_lookup_spacing() {
        let h = filled(&[4.0, 3.0, 2.0, 1.0], 5, 0.5);
        assert_relative_eq!(h.step_duration(), 0.5);
        assert_relative_eq!(h.delayed(0.5).unwrap().motor_angles[0], 3.0);
    }
}
