//! Joint layouts and descriptors for robot-level tests.

use strider_core::{RobotDescriptor, presets};

use crate::mocks::MockSimulator;

const LEGS: [&str; 4] = ["FR", "FL", "RR", "RL"];

fn foot_joint_name(descriptor: &RobotDescriptor, leg: usize) -> String {
    let tag = LEGS.get(leg).copied().unwrap_or("X");
    match descriptor.name.as_str() {
        "laikago" => format!("jtoe{tag}"),
        "mini_cheetah" => format!("toe_{}", tag.to_lowercase()),
        _ => format!("foot_{leg}"),
    }
}

/// Joint names in body order: each leg's motors followed by its foot.
pub fn joint_names_for(descriptor: &RobotDescriptor) -> Vec<String> {
    let per_leg = descriptor.dofs_per_leg.max(1);
    descriptor
        .motor_names
        .chunks(per_leg)
        .enumerate()
        .flat_map(|(leg, motors)| {
            motors
                .iter()
                .cloned()
                .chain(std::iter::once(foot_joint_name(descriptor, leg)))
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Mock engine with the descriptor's joints and physics step.
pub fn mock_simulator(descriptor: &RobotDescriptor) -> MockSimulator {
    MockSimulator::new(joint_names_for(descriptor)).with_time_step(descriptor.time_step)
}

/// Laikago with a coarse physics step and a short control step.
///
/// 4 sub-steps of 1/256 s per control step; exact in binary floating point.
pub fn fast_laikago() -> RobotDescriptor {
    let mut d = presets::laikago();
    d.time_step = 1.0 / 256.0;
    d.action_repeat = 4;
    d.control_latency = 2.0 / 256.0;
    d.overheat_time = 8.0 / 256.0;
    d
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn laikago_layout_has_a_foot_per_leg() {
        let names = joint_names_for(&presets::laikago());
        assert_eq!(names.len(), 16);
        assert_eq!(names[0], "FR_hip_motor_2_chassis_joint");
        assert_eq!(names[3], "jtoeFR");
        assert_eq!(names[15], "jtoeRL");
    }

    #[test]
    fn mini_cheetah_feet_are_lowercase() {
        let names = joint_names_for(&presets::mini_cheetah());
        assert_eq!(names[7], "toe_fl");
    }

    #[test]
    fn fast_laikago_validates() {
        let d = fast_laikago();
        d.validate().unwrap();
        assert!((d.control_time_step() - 1.0 / 64.0).abs() < f64::EPSILON);
    }
}
