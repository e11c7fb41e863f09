//! Link classification by joint name.
//!
//! Each joint of the loaded body is matched against the descriptor's
//! patterns in the order chassis, motor, knee, foot. Patterns are anchored at
//! the start of the name only, so `\w+_chassis_\w+` matches
//! `FR_hip_motor_2_chassis_joint`.

use std::collections::BTreeMap;

use regex::Regex;
use strider_core::{
    BASE_LINK, BodyId, ConfigError, JointPatterns, LinkId, SimError, SimulatorLink, StriderError,
};

/// Category of one link.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LinkCategory {
    Chassis,
    Motor,
    Knee,
    Foot,
}

// ---------------------------------------------------------------------------
// JointClassifier
// ---------------------------------------------------------------------------

/// Compiled joint-name patterns.
#[derive(Clone, Debug)]
pub struct JointClassifier {
    patterns: [(LinkCategory, Regex); 4],
}

fn compile(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(&format!("^(?:{pattern})")).map_err(|e| ConfigError::InvalidPattern {
        pattern: pattern.to_owned(),
        message: e.to_string(),
    })
}

impl JointClassifier {
    pub fn new(patterns: &JointPatterns) -> Result<Self, ConfigError> {
        Ok(Self {
            patterns: [
                (LinkCategory::Chassis, compile(&patterns.chassis)?),
                (LinkCategory::Motor, compile(&patterns.motor)?),
                (LinkCategory::Knee, compile(&patterns.knee)?),
                (LinkCategory::Foot, compile(&patterns.foot)?),
            ],
        })
    }

    /// First category whose pattern matches `name`.
    pub fn classify(&self, name: &str) -> Option<LinkCategory> {
        self.patterns
            .iter()
            .find(|(_, re)| re.is_match(name))
            .map(|(category, _)| *category)
    }
}

// ---------------------------------------------------------------------------
// LinkLayout
// ---------------------------------------------------------------------------

/// Link ids of a loaded body grouped by category, each list sorted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LinkLayout {
    /// Always starts with the base link.
    pub chassis: Vec<LinkId>,
    pub motor: Vec<LinkId>,
    pub knee: Vec<LinkId>,
    /// Feet and knees: either may touch the ground depending on the model.
    pub foot: Vec<LinkId>,
    /// Knees and feet.
    pub leg: Vec<LinkId>,
    names: BTreeMap<String, LinkId>,
}

impl LinkLayout {
    /// Read every joint of `body` and classify it.
    pub fn build<S: SimulatorLink>(
        sim: &S,
        body: BodyId,
        classifier: &JointClassifier,
    ) -> Result<Self, StriderError> {
        let mut layout = Self {
            chassis: vec![BASE_LINK],
            ..Self::default()
        };
        for index in 0..sim.num_joints(body)? {
            let info = sim.joint_info(body, index)?;
            let category = classifier
                .classify(&info.name)
                .ok_or_else(|| ConfigError::UnknownJointCategory(info.name.clone()))?;
            match category {
                LinkCategory::Chassis => layout.chassis.push(info.index),
                LinkCategory::Motor => layout.motor.push(info.index),
                LinkCategory::Knee => layout.knee.push(info.index),
                LinkCategory::Foot => layout.foot.push(info.index),
            }
            layout.names.insert(info.name, info.index);
        }

        layout.leg.extend(&layout.knee);
        layout.leg.extend(&layout.foot);
        layout.foot.extend(&layout.knee);
        for ids in [
            &mut layout.chassis,
            &mut layout.motor,
            &mut layout.knee,
            &mut layout.foot,
            &mut layout.leg,
        ] {
            ids.sort_unstable();
        }
        Ok(layout)
    }

    pub fn joint_id(&self, name: &str) -> Result<LinkId, SimError> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| SimError::UnknownJoint(name.to_owned()))
    }

    /// Joint ids of `names`, in the given order.
    pub fn ids_of(&self, names: &[String]) -> Result<Vec<LinkId>, SimError> {
        names.iter().map(|n| self.joint_id(n)).collect()
    }

    /// Leg links followed by motor links: the order leg masses and inertias
    /// are given in.
    pub fn leg_and_motor(&self) -> Vec<LinkId> {
        self.leg.iter().chain(&self.motor).copied().collect()
    }

    /// Every joint id of the body, in index order.
    pub fn joints(&self) -> Vec<LinkId> {
        let mut ids: Vec<LinkId> = self.names.values().copied().collect();
        ids.sort_unstable();
        ids
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
