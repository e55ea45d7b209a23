//! Gestures
//!
//! Each gesture is an ordered table of tagged steps driven by one generic,
//! time-gated sequencer. Three gestures exist: Scroll (interpolated
//! glides), Like (two pose variants) and Dubious (poses with random-length
//! pauses).

pub mod sequencer;
pub mod steps;

pub use sequencer::Sequencer;
pub use steps::{GestureKind, GestureTables, LikeVariant, Step, StepTable};
