//! Structured events emitted while randomizing.

use crate::params::RandomizationParam;

/// Something the randomizer did.
#[derive(Clone, Debug, PartialEq)]
pub enum RandomizationEvent {
    /// A parameter was written to the robot.
    Applied {
        param: RandomizationParam,
        physical: Vec<f32>,
    },
    /// Every rejecting parameter landed in its forbidden range; the batch is
    /// drawn again.
    Rejected { attempt: u64 },
    /// A stored sample was re-applied instead of drawing.
    Replayed { params: usize },
}

/// Callback receiving every [`RandomizationEvent`].
pub type EventSink = Box<dyn FnMut(&RandomizationEvent) + Send + Sync>;
