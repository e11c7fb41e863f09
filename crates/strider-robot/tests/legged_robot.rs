//! Integration test: a full Laikago (and Mini Cheetah) over the mock engine.
//!
//! Checks the control step end to end:
//! 1. Reset settles the robot and returns the configured sensors
//! 2. Actions are shaped, clamped and converted to joint-space torques
//! 3. Safety, setters and reloads reach the simulator
//! 4. Randomization samples replay bit for bit

use std::sync::{Arc, Mutex};

use approx::assert_relative_eq;
use strider_core::{
    BASE_LINK, BaseVelocity, BasePose, ConfigError, SimulatorLink, StriderError, ValidationError,
    presets,
};
use strider_robot::prelude::*;
use strider_robot::readings::{from_unit, quaternion_from_rpy, to_unit};
use strider_test_utils::{MockSimulator, fast_laikago, mock_simulator, mocks::default_link_mass};

fn laikago(options: RobotOptions) -> LeggedRobot<MockSimulator> {
    let d = fast_laikago();
    LeggedRobot::new(mock_simulator(&d), d, options).unwrap()
}

fn unshaped() -> RobotOptions {
    RobotOptions {
        shaper: ShaperConfig {
            filter: false,
            ..ShaperConfig::default()
        },
        ..RobotOptions::default().without_settling()
    }
}

fn torque_mode() -> RobotOptions {
    RobotOptions {
        control_mode: ControlMode::Torque,
        ..RobotOptions::default().without_settling()
    }
}

// ---------------------------------------------------------------------------
// Reset
// ---------------------------------------------------------------------------

#[test]
fn reset_returns_default_sensors() {
    let mut robot = laikago(RobotOptions::default().without_settling());
    let obs = robot.reset(false).unwrap();

    let keys: Vec<&str> = obs.keys().map(String::as_str).collect();
    assert_eq!(keys, ["IMU", "MotorAngle"]);
    assert_eq!(obs["IMU"].len(), 4);
    for (angle, init) in obs["MotorAngle"].iter().zip(&robot.descriptor().init_motor_angles) {
        assert_relative_eq!(*angle, *init, epsilon = 1e-5);
    }
    // base sits at its initial orientation, so the relative frame is identity
    for v in &obs["IMU"] {
        assert_relative_eq!(*v, 0.0, epsilon = 1e-5);
    }
    assert_eq!(robot.observation_space().len(), 2);
    assert!(robot.is_safe());
}

#[test]
fn settling_runs_before_policy_time() {
    let d = fast_laikago();
    let options = RobotOptions {
        settle_steps: 10,
        reset_time: 4.0 / 256.0,
        default_motor_angles: Some(d.init_motor_angles.clone()),
        ..RobotOptions::default()
    };
    let mut robot = LeggedRobot::new(mock_simulator(&d), d, options).unwrap();
    robot.reset(false).unwrap();

    assert_eq!(robot.sim().steps, 14);
    assert_eq!(robot.clock().total_steps(), 14);
    assert_relative_eq!(robot.time_since_reset(), 0.0);
}

#[test]
fn reset_clears_episode_state() {
    let mut robot = laikago(unshaped());
    robot.reset(false).unwrap();
    robot.step(&[0.1; 12]).unwrap();
    assert!(robot.time_since_reset() > 0.0);

    robot.reset(false).unwrap();
    assert_relative_eq!(robot.time_since_reset(), 0.0);
    assert!(robot.last_action().iter().all(|a| *a == 0.0));
    assert_eq!(robot.history().len(), 1);
}

#[test]
fn reload_restores_model_dynamics() {
    let mut robot = laikago(RobotOptions::default().without_settling());
    robot.reset(false).unwrap();
    robot.set_base_masses(&[9.0; 5]).unwrap();

    robot.reset(false).unwrap();
    let mass = robot.sim().link_dynamics(BASE_LINK).unwrap().mass;
    assert_relative_eq!(mass, 9.0);

    robot.reset(true).unwrap();
    assert_eq!(robot.sim().loads, 2);
    assert_eq!(robot.body().0, 1);
    let mass = robot.sim().link_dynamics(BASE_LINK).unwrap().mass;
    assert_relative_eq!(mass, default_link_mass(BASE_LINK));
}

#[test]
fn reload_on_rack_pins_again() {
    let mut robot = laikago(RobotOptions {
        on_rack: true,
        ..RobotOptions::default().without_settling()
    });
    robot.reset(true).unwrap();
    let rack = robot.sim().rack.unwrap();
    assert_eq!(rack.position, [0.0, 0.0, 1.0]);
}

#[test]
fn reset_at_current_position_keeps_heading() {
    let mut robot = laikago(RobotOptions {
        reset_at_current_position: true,
        ..RobotOptions::default().without_settling()
    });
    robot.reset(false).unwrap();

    let init = robot.descriptor().init_orientation;
    let yawed = from_unit(&(to_unit(quaternion_from_rpy([0.0, 0.0, 0.5])) * to_unit(init)));
    robot.sim_mut().set_base_state(
        BasePose {
            position: [1.0, 2.0, 0.1],
            orientation: yawed,
        },
        BaseVelocity::default(),
    );
    robot.step(&[0.0; 12]).unwrap();
    robot.reset(false).unwrap();

    let pose = robot.sim().base_pose(robot.body()).unwrap();
    assert_relative_eq!(pose.position[0], 1.0);
    assert_relative_eq!(pose.position[1], 2.0);
    assert_relative_eq!(pose.position[2], 0.48);
    assert_relative_eq!(robot.true_base_roll_pitch_yaw()[2], 0.5, epsilon = 1e-5);
}

// ---------------------------------------------------------------------------
// Stepping
// ---------------------------------------------------------------------------

#[test]
fn step_runs_action_repeat_substeps() {
    let mut robot = laikago(unshaped());
    robot.reset(false).unwrap();
    let obs = robot.step(&[0.0; 12]).unwrap();

    assert_eq!(robot.sim().steps, 4);
    assert_eq!(robot.sim().torque_log.len(), 4);
    assert_relative_eq!(robot.time_since_reset(), 4.0 / 256.0);
    assert_eq!(obs["MotorAngle"].len(), 12);
}

#[test]
fn first_step_interpolates_from_true_angles() {
    let mut robot = laikago(unshaped());
    robot.reset(false).unwrap();
    let mut action = vec![0.0; 12];
    action[0] = 0.1;
    robot.step(&action).unwrap();

    // a quarter of the way toward the target, kp = 220, motor 0 is reversed
    let first = &robot.sim().torque_log[0];
    assert_relative_eq!(first[0], -5.5, epsilon = 1e-3);
    for t in &first[1..] {
        assert_relative_eq!(*t, 0.0, epsilon = 1e-3);
    }
    assert_relative_eq!(robot.last_action()[0], 0.1);
    assert_relative_eq!(robot.last_action()[1], 0.67);
}

#[test]
fn large_targets_are_clamped_per_substep() {
    let mut robot = laikago(RobotOptions {
        shaper: ShaperConfig {
            filter: false,
            interpolation: false,
            ..ShaperConfig::default()
        },
        ..RobotOptions::default().without_settling()
    });
    robot.reset(false).unwrap();
    let mut action = vec![0.0; 12];
    action[1] = 3.0;
    robot.step(&action).unwrap();

    // clamped to 0.2 rad from the true angle
    assert_relative_eq!(robot.sim().torque_log[0][1], 220.0 * 0.2, epsilon = 1e-3);
}

#[test]
fn mini_cheetah_torques_are_limited() {
    let d = presets::mini_cheetah();
    let sim = mock_simulator(&d);
    let mut robot = LeggedRobot::new(sim, d, torque_mode()).unwrap();
    robot.reset(false).unwrap();
    robot.step(&[100.0; 12]).unwrap();

    assert_eq!(robot.sim().torque_log.len(), 20);
    for t in &robot.sim().torque_log[0] {
        assert_relative_eq!(*t, 18.0);
    }
    for t in robot.true_motor_torques() {
        assert_relative_eq!(*t, 18.0);
    }
}

#[test]
fn battery_and_strength_scale_torque() {
    let mut robot = laikago(torque_mode());
    robot.reset(false).unwrap();
    robot.set_battery_voltage(8.0);
    robot.set_motor_strength_ratio(0.5);
    let mut action = vec![0.0; 12];
    action[1] = 4.0;
    robot.step(&action).unwrap();

    assert_relative_eq!(robot.sim().torque_log[0][1], 1.0, epsilon = 1e-6);
}

#[test]
fn overheated_motor_applies_no_torque() {
    let mut robot = laikago(RobotOptions {
        motor_overheat_protection: true,
        ..torque_mode()
    });
    robot.reset(false).unwrap();
    let mut action = vec![0.0; 12];
    action[0] = 10.0;
    for _ in 0..3 {
        robot.step(&action).unwrap();
    }

    // 8 steps allowed, the 9th trips and is already zeroed
    let log = &robot.sim().torque_log;
    assert_relative_eq!(log[7][0], -10.0);
    assert_relative_eq!(log[8][0], 0.0);
    assert_relative_eq!(log[11][0], 0.0);
    assert!(!robot.is_safe());
    assert!(!robot.enabled_list()[0]);
    assert!(robot.enabled_list()[1..].iter().all(|e| *e));

    robot.reset(false).unwrap();
    assert!(robot.is_safe());
}

#[test]
fn energy_follows_torque_and_velocity() {
    let mut robot = laikago(torque_mode());
    robot.reset(false).unwrap();
    robot.step(&[0.0; 12]).unwrap();
    assert_relative_eq!(robot.energy_consumption_per_step(), 0.0);

    robot.step(&[2.0; 12]).unwrap();
    let energy = robot.energy_consumption_per_step();
    assert!(energy > 0.0);
    assert_relative_eq!(energy, robot.readings().power() * 4.0 / 256.0);
}

#[test]
fn action_repeat_changes_substeps() {
    let mut robot = laikago(unshaped());
    robot.reset(false).unwrap();
    assert!(matches!(
        robot.set_action_repeat(0),
        Err(ConfigError::InvalidValue { .. })
    ));
    robot.set_action_repeat(2).unwrap();
    robot.step(&[0.0; 12]).unwrap();
    assert_eq!(robot.sim().steps, 2);
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[test]
fn bad_actions_are_rejected() {
    let mut robot = laikago(RobotOptions::default().without_settling());
    robot.reset(false).unwrap();

    let err = robot.step(&[0.0; 11]).unwrap_err();
    assert!(matches!(
        err,
        StriderError::Validation(ValidationError::ActionDimMismatch {
            expected: 12,
            got: 11
        })
    ));
    let mut action = vec![0.0; 12];
    action[4] = f32::NAN;
    assert!(matches!(
        robot.step(&action),
        Err(StriderError::Validation(ValidationError::ActionContainsNan))
    ));
    assert_eq!(robot.sim().steps, 0);
}

#[test]
fn hybrid_mode_takes_five_values_per_motor() {
    let mut robot = laikago(RobotOptions {
        control_mode: ControlMode::Hybrid,
        ..RobotOptions::default().without_settling()
    });
    robot.reset(false).unwrap();
    assert!(robot.step(&[0.0; 12]).is_err());
    robot.step(&[0.0; 60]).unwrap();
    assert_eq!(robot.sim().steps, 4);
}

#[test]
fn hybrid_target_angles_are_clamped() {
    let mut robot = laikago(RobotOptions {
        control_mode: ControlMode::Hybrid,
        ..RobotOptions::default().without_settling()
    });
    robot.reset(false).unwrap();
    let command: Vec<f32> = (0..12).flat_map(|_| [3.0, 0.0, 500.0, 0.0, 0.0]).collect();
    robot.step(&command).unwrap();

    // angle slot held to 0.2 rad from the true angle, gains untouched
    let first = &robot.sim().torque_log[0];
    assert_relative_eq!(first[1], 500.0 * 0.2, epsilon = 1e-2);
    assert_relative_eq!(first[0], -500.0 * 0.2, epsilon = 1e-2);
}

#[test]
fn short_mass_list_is_rejected_without_writes() {
    let mut robot = laikago(RobotOptions::default().without_settling());
    let err = robot.set_base_masses(&[1.0; 4]).unwrap_err();
    assert!(matches!(
        err,
        StriderError::Config(ConfigError::LengthMismatch {
            expected: 5,
            got: 4,
            ..
        })
    ));
    assert!(robot.sim().param_log.is_empty());
}

#[test]
fn joint_frictions_target_feet_and_knees() {
    let mut robot = laikago(RobotOptions::default().without_settling());
    assert!(robot.set_joint_frictions(&[0.1; 4]).is_err());
    robot.set_joint_frictions(&[0.1; 8]).unwrap();
    let sim = robot.sim();
    assert_relative_eq!(sim.joint_by_name("jtoeFR").unwrap().friction, 0.1);
    assert_relative_eq!(
        sim.joint_by_name("FR_lower_leg_2_upper_leg_joint").unwrap().friction,
        0.1
    );
    assert_relative_eq!(
        sim.joint_by_name("FR_hip_motor_2_chassis_joint").unwrap().friction,
        0.0
    );
}

// ---------------------------------------------------------------------------
// Sensors and noise
// ---------------------------------------------------------------------------

#[test]
fn historic_last_action_stacks_frames() {
    let mut robot = laikago(unshaped().with_sensors(vec![SensorConfig::LastAction { history: 2 }]));
    robot.reset(false).unwrap();
    let obs = robot.step(&[0.1; 12]).unwrap();

    let stacked = &obs["LastActionHistory"];
    assert_eq!(stacked.len(), 24);
    assert_relative_eq!(stacked[1], 0.77, epsilon = 1e-6);
    assert!(stacked[12..].iter().all(|v| *v == 0.0));
}

#[test]
fn observation_noise_is_seeded() {
    let run = |seed| {
        let mut d = fast_laikago();
        d.observation_noise_stdev = [0.01; 5];
        let mut robot =
            LeggedRobot::new(mock_simulator(&d), d, unshaped().with_seed(seed)).unwrap();
        robot.reset(false).unwrap();
        robot.step(&[0.0; 12]).unwrap()
    };
    assert_eq!(run(1), run(1));
    assert_ne!(run(1), run(2));
}

// ---------------------------------------------------------------------------
// Randomization
// ---------------------------------------------------------------------------

fn randomized(seed: u64) -> LeggedRobot<MockSimulator> {
    laikago(RobotOptions {
        enable_randomizer: true,
        ..RobotOptions::default().without_settling().with_seed(seed)
    })
}

fn physical_state(robot: &LeggedRobot<MockSimulator>) -> (Vec<f32>, Vec<f32>, f32, f64) {
    let masses = (BASE_LINK..16)
        .map(|l| robot.sim().link_dynamics(l).unwrap().mass)
        .collect();
    let frictions = robot.sim().joints().iter().map(|j| j.friction).collect();
    (
        masses,
        frictions,
        robot.motor_model().voltage(),
        robot.control_latency(),
    )
}

#[test]
fn stored_sample_replays_bit_identically() {
    let mut a = randomized(3);
    a.reset(false).unwrap();
    let sample = a.randomization_parameters();
    assert!(!sample.is_empty());

    let mut b = randomized(99);
    b.set_randomization_parameters(&sample).unwrap();
    assert_eq!(physical_state(&a), physical_state(&b));
    assert_eq!(b.randomization_parameters(), sample);
}

#[test]
fn suspended_randomizer_replays_last_sample() {
    let mut robot = randomized(5);
    robot.reset(false).unwrap();
    let sample = robot.randomization_parameters();
    let state = physical_state(&robot);

    robot.set_randomization_suspended(true);
    robot.reset(false).unwrap();
    assert_eq!(robot.randomization_parameters(), sample);
    assert_eq!(physical_state(&robot), state);

    robot.set_randomization_suspended(false);
    robot.reset(false).unwrap();
    assert_ne!(robot.randomization_parameters(), sample);
}

#[test]
fn fixed_randomization_seed_repeats_sample() {
    let mut robot = laikago(RobotOptions {
        enable_randomizer: true,
        randomization_seed: Some(7),
        ..RobotOptions::default().without_settling()
    });
    robot.reset(false).unwrap();
    let first = robot.randomization_parameters();
    robot.reset(false).unwrap();
    assert_eq!(robot.randomization_parameters(), first);
}

#[test]
fn events_reach_the_sink() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let mut robot = randomized(1);
    let log = Arc::clone(&events);
    robot.set_randomization_event_sink(Box::new(move |e: &RandomizationEvent| {
        log.lock().unwrap().push(e.clone());
    }));
    robot.reset(false).unwrap();

    let events = events.lock().unwrap();
    let applied = events
        .iter()
        .filter(|e| matches!(e, RandomizationEvent::Applied { .. }))
        .count();
    assert!(applied >= 8, "{events:?}");
}

#[test]
fn strength_events_match_the_motor_model() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let mut robot = randomized(11);
    let log = Arc::clone(&events);
    robot.set_randomization_event_sink(Box::new(move |e: &RandomizationEvent| {
        log.lock().unwrap().push(e.clone());
    }));
    robot.reset(false).unwrap();

    let events = events.lock().unwrap();
    let physical = events
        .iter()
        .find_map(|e| match e {
            RandomizationEvent::Applied { param, physical } if param.name() == "motor strength" => {
                Some(physical.clone())
            }
            _ => None,
        })
        .unwrap();
    assert_eq!(physical, robot.motor_model().strength_ratios());
    assert!(physical.iter().all(|r| (0.8..=1.0).contains(r)), "{physical:?}");
}

#[test]
fn disabled_randomizer_leaves_dynamics_alone() {
    let mut robot = laikago(RobotOptions::default().without_settling());
    robot.reset(false).unwrap();
    assert!(robot.sim().param_log.is_empty());
    assert!(robot.randomization_parameters().is_empty());
}
