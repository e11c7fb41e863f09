//! The randomization engine.
//!
//! Each call to [`Randomizer::randomize`] draws every configured parameter in
//! name order and applies it. When parameters carry forbidden sub-ranges, the
//! whole batch is drawn again for as long as every one of them lands inside
//! its forbidden range. The loop has no attempt cap: a forbidden range that
//! covers the whole target range never terminates.

use std::collections::BTreeMap;
use std::fmt;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use strider_core::{ConfigError, StriderError};
use tracing::{debug, warn};

use crate::configs::RandomizationSpec;
use crate::events::{EventSink, RandomizationEvent};
use crate::params::RandomizationParam;
use crate::ranges::ParamBounds;
use crate::sample::RandomizationSample;
use crate::target::RandomizationTarget;

/// Rejection attempts between progress warnings.
const REJECTION_WARN_INTERVAL: u64 = 10_000;

fn emit(sink: &mut Option<EventSink>, event: &RandomizationEvent) {
    debug!("strider-domain-rand: {event:?}");
    if let Some(sink) = sink {
        sink(event);
    }
}

// ---------------------------------------------------------------------------
// Randomizer
// ---------------------------------------------------------------------------

/// Draws, applies and replays physical parameter perturbations.
pub struct Randomizer {
    spec: RandomizationSpec,
    bounds: ParamBounds,
    /// Re-seeds the RNG before every draw when set.
    seed: Option<u64>,
    rng: ChaCha8Rng,
    suspended: bool,
    last: RandomizationSample,
    sink: Option<EventSink>,
}

impl Randomizer {
    pub fn new(spec: RandomizationSpec, rng: ChaCha8Rng) -> Self {
        Self {
            spec,
            bounds: ParamBounds::default(),
            seed: None,
            rng,
            suspended: false,
            last: RandomizationSample::new(),
            sink: None,
        }
    }

    /// Build from a named spec.
    pub fn from_spec_name(name: &str, rng: ChaCha8Rng) -> Result<Self, ConfigError> {
        Ok(Self::new(RandomizationSpec::by_name(name)?, rng))
    }

    /// Builder: interval normalized samples are drawn from.
    #[must_use]
    pub const fn with_param_bounds(mut self, bounds: ParamBounds) -> Self {
        self.bounds = bounds;
        self
    }

    /// Builder: draw the same sample every time.
    #[must_use]
    pub const fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Builder: receive a [`RandomizationEvent`] for every action taken.
    #[must_use]
    pub fn with_event_sink(mut self, sink: EventSink) -> Self {
        self.sink = Some(sink);
        self
    }

    pub const fn spec(&self) -> &RandomizationSpec {
        &self.spec
    }

    pub const fn param_bounds(&self) -> ParamBounds {
        self.bounds
    }

    pub const fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub const fn set_seed(&mut self, seed: Option<u64>) {
        self.seed = seed;
    }

    pub const fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// While suspended, [`randomize`](Self::randomize) replays the last
    /// sample instead of drawing.
    pub const fn set_suspended(&mut self, suspended: bool) {
        self.suspended = suspended;
    }

    /// Copy of the last drawn or applied sample.
    pub fn parameters(&self) -> RandomizationSample {
        self.last.clone()
    }

    /// Randomize `target` for a new episode.
    pub fn randomize(&mut self, target: &mut dyn RandomizationTarget) -> Result<(), StriderError> {
        if self.suspended {
            if !self.last.is_empty() {
                let sample = self.last.clone();
                self.apply_sample(&sample, target)?;
            }
            return Ok(());
        }

        if let Some(seed) = self.seed {
            self.rng = ChaCha8Rng::seed_from_u64(seed);
        }

        let mut physical = self.draw_and_apply(target)?;
        let mut attempt = 0_u64;
        while self.all_rejected(&physical) {
            attempt += 1;
            emit(&mut self.sink, &RandomizationEvent::Rejected { attempt });
            if attempt % REJECTION_WARN_INTERVAL == 0 {
                warn!(
                    "strider-domain-rand: {attempt} batches rejected; check that the forbidden ranges leave room to escape"
                );
            }
            physical = self.draw_and_apply(target)?;
        }
        Ok(())
    }

    /// Apply a stored sample verbatim and remember it.
    ///
    /// Every parameter in `sample` must be part of the spec; otherwise
    /// nothing is applied.
    pub fn set_from_parameters(
        &mut self,
        sample: &RandomizationSample,
        target: &mut dyn RandomizationTarget,
    ) -> Result<(), StriderError> {
        self.apply_sample(sample, target)?;
        self.last = sample.clone();
        Ok(())
    }

    fn apply_sample(
        &mut self,
        sample: &RandomizationSample,
        target: &mut dyn RandomizationTarget,
    ) -> Result<(), StriderError> {
        if let Some((param, _)) = sample.iter().find(|(p, _)| self.spec.get(*p).is_none()) {
            return Err(ConfigError::UnknownRandomizationParam(param.name().to_owned()).into());
        }
        for (param, value) in sample.iter() {
            let Some(range) = self.spec.get(param) else {
                continue;
            };
            let physical = param.apply(value, range, self.bounds, target)?;
            emit(&mut self.sink, &RandomizationEvent::Applied { param, physical });
        }
        emit(
            &mut self.sink,
            &RandomizationEvent::Replayed {
                params: sample.len(),
            },
        );
        Ok(())
    }

    fn draw_and_apply(
        &mut self,
        target: &mut dyn RandomizationTarget,
    ) -> Result<BTreeMap<RandomizationParam, Vec<f32>>, StriderError> {
        let mut sample = RandomizationSample::new();
        let mut applied = BTreeMap::new();
        for (param, range) in self.spec.iter() {
            let value = param.draw(&mut self.rng, self.bounds, &*target);
            let physical = param.apply(&value, range, self.bounds, target)?;
            emit(
                &mut self.sink,
                &RandomizationEvent::Applied {
                    param,
                    physical: physical.clone(),
                },
            );
            sample.insert(param, value);
            applied.insert(param, physical);
        }
        self.last = sample;
        Ok(applied)
    }

    /// True when every parameter with a forbidden range landed inside it.
    fn all_rejected(&self, physical: &BTreeMap<RandomizationParam, Vec<f32>>) -> bool {
        let mut rejecting = self
            .spec
            .iter()
            .filter(|(_, range)| range.rejection().is_some())
            .peekable();
        if rejecting.peek().is_none() {
            return false;
        }
        rejecting.all(|(param, range)| {
            physical
                .get(&param)
                .is_some_and(|values| range.rejects(values))
        })
    }
}

impl fmt::Debug for Randomizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Randomizer")
            .field("spec", &self.spec)
            .field("bounds", &self.bounds)
            .field("seed", &self.seed)
            .field("suspended", &self.suspended)
            .field("last", &self.last)
            .field("sink", &self.sink.is_some())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::configs::all_params;
    use crate::ranges::ParamRange;
    use crate::sample::SampleValue;

    /// Records every value written by the randomizer.
    #[derive(Debug)]
    struct FakeRobot {
        base_masses: Vec<f32>,
        leg_masses: Vec<f32>,
        base_inertias: Vec<[f32; 3]>,
        leg_inertias: Vec<[f32; 3]>,
        latency: f64,
        joint_frictions: Vec<f32>,
        damping: f32,
        restitution: f32,
        friction: f32,
        voltage: f32,
        strength: Vec<f32>,
        repeat: usize,
        writes: usize,
    }

    impl FakeRobot {
        fn new() -> Self {
            Self {
                base_masses: vec![0.0],
                leg_masses: vec![0.0; 8],
                base_inertias: vec![[0.0; 3]],
                leg_inertias: vec![[0.0; 3]; 8],
                latency: 0.0,
                joint_frictions: vec![0.0; 4],
                damping: 0.0,
                restitution: 0.0,
                friction: 0.0,
                voltage: 0.0,
                strength: vec![1.0; 8],
                repeat: 10,
                writes: 0,
            }
        }
    }

    impl RandomizationTarget for FakeRobot {
        fn num_motors(&self) -> usize {
            8
        }
        fn num_legs(&self) -> usize {
            4
        }
        fn num_knee_joints(&self) -> usize {
            4
        }
        fn base_masses_from_model(&self) -> Vec<f32> {
            vec![2.0]
        }
        fn leg_masses_from_model(&self) -> Vec<f32> {
            vec![0.5; 8]
        }
        fn base_inertias_from_model(&self) -> Vec<[f32; 3]> {
            vec![[1.0, 2.0, 3.0]]
        }
        fn leg_inertias_from_model(&self) -> Vec<[f32; 3]> {
            vec![[0.1; 3]; 8]
        }
        fn set_base_masses(&mut self, masses: &[f32]) -> Result<(), StriderError> {
            ConfigError::check_len("base masses", 1, masses.len())?;
            self.base_masses = masses.to_vec();
            self.writes += 1;
            Ok(())
        }
        fn set_leg_masses(&mut self, masses: &[f32]) -> Result<(), StriderError> {
            ConfigError::check_len("leg masses", 8, masses.len())?;
            self.leg_masses = masses.to_vec();
            self.writes += 1;
            Ok(())
        }
        fn set_base_inertias(&mut self, inertias: &[[f32; 3]]) -> Result<(), StriderError> {
            self.base_inertias = inertias.to_vec();
            self.writes += 1;
            Ok(())
        }
        fn set_leg_inertias(&mut self, inertias: &[[f32; 3]]) -> Result<(), StriderError> {
            self.leg_inertias = inertias.to_vec();
            self.writes += 1;
            Ok(())
        }
        fn set_control_latency(&mut self, latency: f64) {
            self.latency = latency;
            self.writes += 1;
        }
        fn set_joint_frictions(&mut self, frictions: &[f32]) -> Result<(), StriderError> {
            self.joint_frictions = frictions.to_vec();
            self.writes += 1;
            Ok(())
        }
        fn set_motor_viscous_damping(&mut self, damping: f32) {
            self.damping = damping;
            self.writes += 1;
        }
        fn set_foot_restitution(&mut self, restitution: f32) -> Result<(), StriderError> {
            self.restitution = restitution;
            self.writes += 1;
            Ok(())
        }
        fn set_foot_friction(&mut self, friction: f32) -> Result<(), StriderError> {
            self.friction = friction;
            self.writes += 1;
            Ok(())
        }
        fn set_battery_voltage(&mut self, volts: f32) {
            self.voltage = volts;
            self.writes += 1;
        }
        fn set_motor_strength_ratios(&mut self, ratios: &[f32]) -> Result<(), StriderError> {
            self.strength = ratios.to_vec();
            self.writes += 1;
            Ok(())
        }
        fn set_action_repeat(&mut self, repeat: usize) -> Result<(), StriderError> {
            self.repeat = repeat;
            self.writes += 1;
            Ok(())
        }
    }

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    fn single(param: RandomizationParam, low: f32, high: f32) -> RandomizationSpec {
        RandomizationSpec::new().with(param, ParamRange::new(low, high).unwrap())
    }

    #[test]
    fn all_params_within_ranges() {
        let mut r = Randomizer::new(all_params(), rng());
        let mut robot = FakeRobot::new();
        r.randomize(&mut robot).unwrap();
        assert!((14.0..=16.8).contains(&robot.voltage));
        assert!((0.0..=0.04).contains(&robot.latency));
        assert!((1.6..=2.4).contains(&robot.base_masses[0]));
        assert!(robot.strength.iter().all(|s| (0.8..=1.0).contains(s)));
        assert_eq!(r.parameters().len(), 8);
    }

    #[test]
    fn fixed_seed_repeats_sample() {
        let mut r = Randomizer::new(all_params(), rng()).with_seed(Some(7));
        let mut robot = FakeRobot::new();
        r.randomize(&mut robot).unwrap();
        let first = r.parameters();
        r.randomize(&mut robot).unwrap();
        assert_eq!(r.parameters(), first);
    }

    #[test]
    fn unseeded_draws_differ() {
        let mut r = Randomizer::new(all_params(), rng());
        let mut robot = FakeRobot::new();
        r.randomize(&mut robot).unwrap();
        let first = r.parameters();
        r.randomize(&mut robot).unwrap();
        assert_ne!(r.parameters(), first);
    }

    #[test]
    fn suspended_without_sample_does_nothing() {
        let mut r = Randomizer::new(all_params(), rng());
        r.set_suspended(true);
        let mut robot = FakeRobot::new();
        r.randomize(&mut robot).unwrap();
        assert_eq!(robot.writes, 0);
        assert!(r.parameters().is_empty());
    }

    #[test]
    fn suspended_replays_bit_for_bit() {
        let mut r = Randomizer::new(all_params(), rng());
        let mut robot = FakeRobot::new();
        r.randomize(&mut robot).unwrap();
        let sample = r.parameters();
        let voltage = robot.voltage;
        let masses = robot.leg_masses.clone();

        let mut fresh = FakeRobot::new();
        r.set_suspended(true);
        r.randomize(&mut fresh).unwrap();
        assert_eq!(fresh.voltage.to_bits(), voltage.to_bits());
        assert_eq!(fresh.leg_masses, masses);
        assert_eq!(r.parameters(), sample);
    }

    #[test]
    fn rejection_redraws_until_outside_forbidden_range() {
        let range = ParamRange::new(14.0, 16.8)
            .unwrap()
            .with_rejection(14.0, 16.0)
            .unwrap();
        let spec = RandomizationSpec::new().with(RandomizationParam::Battery, range);
        let events = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&events);
        let mut r = Randomizer::new(spec, rng()).with_event_sink(Box::new(move |e: &RandomizationEvent| {
            captured.lock().unwrap().push(e.clone());
        }));
        let mut robot = FakeRobot::new();
        for _ in 0..20 {
            r.randomize(&mut robot).unwrap();
            assert!(robot.voltage > 16.0, "voltage {}", robot.voltage);
        }
        let rejected = events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, RandomizationEvent::Rejected { .. }))
            .count();
        assert!(rejected > 0);
    }

    #[test]
    fn rejection_needs_every_rejecting_param_inside() {
        // Battery is always forbidden, latency never is: no batch is rejected.
        let spec = RandomizationSpec::new()
            .with(
                RandomizationParam::Battery,
                ParamRange::new(14.0, 16.8).unwrap().with_rejection(0.0, 100.0).unwrap(),
            )
            .with(
                RandomizationParam::Latency,
                ParamRange::new(0.0, 0.04).unwrap().with_rejection(1.0, 2.0).unwrap(),
            );
        let mut r = Randomizer::new(spec, rng());
        let mut robot = FakeRobot::new();
        r.randomize(&mut robot).unwrap();
        assert_eq!(r.parameters().len(), 2);
    }

    #[test]
    fn leg_weaken_touches_one_leg() {
        let mut r = Randomizer::new(single(RandomizationParam::LegWeaken, 0.5, 0.6), rng());
        let mut robot = FakeRobot::new();
        r.randomize(&mut robot).unwrap();
        let Some(SampleValue::LegWeaken { leg, .. }) =
            r.parameters().get(RandomizationParam::LegWeaken).cloned()
        else {
            panic!("leg weaken sample missing");
        };
        for (i, s) in robot.strength.iter().enumerate() {
            if i / 2 == leg {
                assert!((0.5..=0.6).contains(s));
            } else {
                assert!((s - 1.0).abs() < f32::EPSILON);
            }
        }
    }

    #[test]
    fn single_leg_weaken_uses_first_leg() {
        let mut r = Randomizer::new(single(RandomizationParam::SingleLegWeaken, 0.3, 0.3), rng());
        let mut robot = FakeRobot::new();
        r.randomize(&mut robot).unwrap();
        assert_eq!(robot.strength, vec![0.3, 0.3, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn strength_events_report_the_clamped_ratios() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&events);
        let spec = single(RandomizationParam::MotorStrength, 1.1, 1.3)
            .with(RandomizationParam::GlobalMotorStrength, ParamRange::new(-0.5, -0.1).unwrap());
        let mut r = Randomizer::new(spec, rng()).with_event_sink(Box::new(move |e: &RandomizationEvent| {
            captured.lock().unwrap().push(e.clone());
        }));
        let mut robot = FakeRobot::new();
        r.randomize(&mut robot).unwrap();

        // "global motor strength" sorts first, so "motor strength" wins.
        assert_eq!(robot.strength, vec![1.0; 8]);
        let events = events.lock().unwrap();
        for e in events.iter() {
            match e {
                RandomizationEvent::Applied { param: RandomizationParam::MotorStrength, physical } => {
                    assert_eq!(physical, &robot.strength);
                }
                RandomizationEvent::Applied { param: RandomizationParam::GlobalMotorStrength, physical } => {
                    assert_eq!(physical, &vec![0.0]);
                }
                other => panic!("unexpected event {other:?}"),
            }
        }
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn control_step_truncates() {
        let mut r = Randomizer::new(single(RandomizationParam::ControlStep, 5.0, 5.9), rng());
        let mut robot = FakeRobot::new();
        r.randomize(&mut robot).unwrap();
        assert_eq!(robot.repeat, 5);
    }

    #[test]
    fn individual_inertia_scales_per_axis() {
        let mut r = Randomizer::new(single(RandomizationParam::IndividualInertia, 2.0, 2.0), rng());
        let mut robot = FakeRobot::new();
        r.randomize(&mut robot).unwrap();
        assert_eq!(robot.base_inertias, vec![[2.0, 4.0, 6.0]]);
        assert_eq!(robot.leg_inertias, vec![[0.2; 3]; 8]);
        let Some(SampleValue::Vector(v)) =
            r.parameters().get(RandomizationParam::IndividualInertia).cloned()
        else {
            panic!("vector sample expected");
        };
        assert_eq!(v.len(), 27);
    }

    #[test]
    fn set_from_parameters_applies_and_stores() {
        let spec = single(RandomizationParam::Battery, 10.0, 20.0);
        let mut r = Randomizer::new(spec, rng());
        let sample: RandomizationSample = [(RandomizationParam::Battery, SampleValue::Scalar(1.0))]
            .into_iter()
            .collect();
        let mut robot = FakeRobot::new();
        r.set_from_parameters(&sample, &mut robot).unwrap();
        assert!((robot.voltage - 20.0).abs() < f32::EPSILON);
        assert_eq!(r.parameters(), sample);
    }

    #[test]
    fn set_from_parameters_rejects_unknown_param() {
        let mut r = Randomizer::new(single(RandomizationParam::Battery, 10.0, 20.0), rng());
        let sample: RandomizationSample = [
            (RandomizationParam::Battery, SampleValue::Scalar(0.0)),
            (RandomizationParam::Latency, SampleValue::Scalar(0.0)),
        ]
        .into_iter()
        .collect();
        let mut robot = FakeRobot::new();
        let err = r.set_from_parameters(&sample, &mut robot).unwrap_err();
        assert!(err.to_string().contains("latency"));
        assert_eq!(robot.writes, 0);
        assert!(r.parameters().is_empty());
    }

    #[test]
    fn wrong_sample_shape_is_error() {
        let mut r = Randomizer::new(single(RandomizationParam::Mass, 0.8, 1.2), rng());
        let sample: RandomizationSample = [(RandomizationParam::Mass, SampleValue::Scalar(0.0))]
            .into_iter()
            .collect();
        let mut robot = FakeRobot::new();
        assert!(r.set_from_parameters(&sample, &mut robot).is_err());
    }

    #[test]
    fn unknown_spec_name() {
        let err = Randomizer::from_spec_name("nope", rng()).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownRandomizationSpec(_)));
    }

    #[test]
    fn events_report_each_applied_param() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&events);
        let mut r = Randomizer::new(all_params(), rng()).with_event_sink(Box::new(move |e: &RandomizationEvent| {
            captured.lock().unwrap().push(e.clone());
        }));
        r.randomize(&mut FakeRobot::new()).unwrap();
        let applied: Vec<_> = events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                RandomizationEvent::Applied { param, .. } => Some(*param),
                _ => None,
            })
            .collect();
        let expected: Vec<_> = all_params().iter().map(|(p, _)| p).collect();
        assert_eq!(applied, expected);
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn randomizer_is_send_sync() {
        assert_send_sync::<Randomizer>();
    }
}
