//! Descriptors for the supported quadrupeds.

use crate::config::{JointPatterns, PerMotor, RobotDescriptor};

const LEGS: [&str; 4] = ["FR", "FL", "RR", "RL"];

fn repeat_per_leg(values: [f32; 3]) -> Vec<f32> {
    values.iter().copied().cycle().take(12).collect()
}

/// Unitree Laikago, 12 motors (abduction, hip, knee per leg).
pub fn laikago() -> RobotDescriptor {
    let motor_names = LEGS
        .iter()
        .flat_map(|leg| {
            [
                format!("{leg}_hip_motor_2_chassis_joint"),
                format!("{leg}_upper_leg_2_hip_motor_joint"),
                format!("{leg}_lower_leg_2_upper_leg_joint"),
            ]
        })
        .collect();

    RobotDescriptor {
        name: "laikago".into(),
        model: "laikago/laikago_toes_limits.urdf".into(),
        num_motors: 12,
        dofs_per_leg: 3,
        time_step: 0.001,
        action_repeat: 33,
        init_position: [0.0, 0.0, 0.48],
        init_rack_position: [0.0, 0.0, 1.0],
        init_orientation: [0.5, 0.5, 0.5, 0.5],
        init_motor_angles: repeat_per_leg([0.0, 0.67, -1.25]),
        joint_directions: vec![-1.0, 1.0, 1.0, 1.0, 1.0, 1.0, -1.0, 1.0, 1.0, 1.0, 1.0, 1.0],
        joint_offsets: repeat_per_leg([0.0, -0.6, 0.66]),
        motor_names,
        kp: PerMotor::Uniform(220.0),
        kd: PerMotor::Each(repeat_per_leg([0.3, 2.0, 2.0])),
        torque_limits: None,
        control_latency: 0.002,
        pd_latency: 0.0,
        max_motor_angle_step: 0.2,
        overheat_torque: 2.45,
        overheat_time: 1.0,
        nominal_voltage: 16.0,
        observation_noise_stdev: [0.0; 5],
        joint_patterns: JointPatterns {
            chassis: r"\w+_chassis_\w+".into(),
            motor: r"\w+_hip_motor_\w+".into(),
            knee: r"\w+_lower_leg_\w+".into(),
            foot: r"jtoe\w*".into(),
        },
    }
}

/// MIT Mini Cheetah, 12 motors (abduction, hip, knee per leg).
pub fn mini_cheetah() -> RobotDescriptor {
    let motor_names = LEGS
        .iter()
        .flat_map(|leg| {
            let leg = leg.to_lowercase();
            [
                format!("torso_to_abduct_{leg}_j"),
                format!("abduct_{leg}_to_thigh_{leg}_j"),
                format!("thigh_{leg}_to_knee_{leg}_j"),
            ]
        })
        .collect();

    RobotDescriptor {
        name: "mini_cheetah".into(),
        model: "mini_cheetah/mini_cheetah.urdf".into(),
        num_motors: 12,
        dofs_per_leg: 3,
        time_step: 0.001,
        action_repeat: 20,
        init_position: [0.0, 0.0, 0.3],
        init_rack_position: [0.0, 0.0, 1.0],
        init_orientation: [0.0, 0.0, 0.0, 1.0],
        init_motor_angles: repeat_per_leg([0.0, -0.8, 1.6]),
        joint_directions: vec![1.0; 12],
        joint_offsets: vec![0.0; 12],
        motor_names,
        kp: PerMotor::Uniform(40.0),
        kd: PerMotor::Uniform(0.6),
        torque_limits: Some(PerMotor::Uniform(18.0)),
        control_latency: 0.002,
        pd_latency: 0.0,
        max_motor_angle_step: 0.2,
        overheat_torque: 17.0,
        overheat_time: 1.0,
        nominal_voltage: 24.0,
        observation_noise_stdev: [0.0; 5],
        joint_patterns: JointPatterns {
            chassis: r"torso_to_abduct_\w+".into(),
            motor: r"abduct_\w+_to_thigh_\w+".into(),
            knee: r"thigh_\w+_to_knee_\w+".into(),
            foot: r"toe_\w+".into(),
        },
    }
}

/// Look up a preset by name.
pub fn by_name(name: &str) -> Option<RobotDescriptor> {
    match name {
        "laikago" => Some(laikago()),
        "mini_cheetah" => Some(mini_cheetah()),
        _ => None,
    }
}
