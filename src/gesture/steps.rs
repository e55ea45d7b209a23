//! Gesture Step Tables
//!
//! Explicit tagged step variants replace per-gesture switch logic: one
//! sequencer drives any table. Default tables reproduce the recorded
//! gesture poses and delays; deployments can override them in the config
//! file.

use serde::{Deserialize, Serialize};

/// The three gesture kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GestureKind {
    /// Flick-and-settle scroll, four interpolated glides
    Scroll,
    /// Double-tap (variant 1) or single long press (variant 2) on the
    /// like button
    Like,
    /// Hesitant scroll: poses separated by random-length pauses
    Dubious,
}

impl GestureKind {
    /// Human-readable name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            GestureKind::Scroll => "scroll",
            GestureKind::Like => "like",
            GestureKind::Dubious => "dubious",
        }
    }
}

/// Which Like table to run. Chosen by fair coin each time the process
/// fires a Like, or explicitly for manual triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LikeVariant {
    /// Double tap: press, lift, press, lift
    #[default]
    DoubleTap = 1,
    /// Single long press
    LongPress = 2,
}

/// One gesture step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Step {
    /// Interpolated move to (y, z) over `duration_ms`. The sequencer does
    /// not advance while the glide is in flight.
    Glide { y: i32, z: i32, duration_ms: u64 },
    /// Immediate servo write(s), bypassing the interpolator. A non-zero
    /// `hold_ms` keeps the pose by gating the next step on
    /// `max(base_delay, hold_ms)` instead of blocking the loop.
    SetPose {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        y: Option<i32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        z: Option<i32>,
        #[serde(default)]
        hold_ms: u64,
    },
    /// Pure delay of a fixed length.
    FixedWait { ms: u64 },
    /// Delay sampled uniformly from `min_ms..=max_ms`, armed on first
    /// visit and consumed exactly once.
    RandomWait { min_ms: u64, max_ms: u64 },
    /// End of gesture: deactivate and, for Like/Dubious, permanently latch
    /// manual potentiometer control off.
    Terminal,
}

/// An ordered, fixed step sequence plus its inter-step gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepTable {
    /// Minimum delay between consecutive steps, milliseconds. Zero for
    /// Scroll, where glide completion gates advancement instead.
    pub base_delay_ms: u64,
    /// The steps, terminal marker last.
    pub steps: Vec<Step>,
}

impl StepTable {
    /// Number of steps including the terminal marker.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Recorded Scroll gesture: flick down, pull, settle back.
    pub fn scroll() -> Self {
        Self {
            base_delay_ms: 0,
            steps: vec![
                Step::Glide { y: 142, z: 142, duration_ms: 200 },
                Step::Glide { y: 110, z: 142, duration_ms: 300 },
                Step::Glide { y: 90, z: 100, duration_ms: 300 },
                Step::Glide { y: 147, z: 100, duration_ms: 0 },
                Step::Terminal,
            ],
        }
    }

    /// Like variant 1: position, press, lift, press, lift.
    pub fn like_double_tap() -> Self {
        Self {
            base_delay_ms: 100,
            steps: vec![
                Step::SetPose { y: Some(140), z: Some(120), hold_ms: 0 },
                Step::SetPose { y: Some(120), z: None, hold_ms: 100 },
                Step::SetPose { y: Some(140), z: None, hold_ms: 0 },
                Step::SetPose { y: Some(120), z: None, hold_ms: 100 },
                Step::SetPose { y: Some(140), z: None, hold_ms: 0 },
                Step::Terminal,
            ],
        }
    }

    /// Like variant 2: position, long press, lift.
    pub fn like_long_press() -> Self {
        Self {
            base_delay_ms: 100,
            steps: vec![
                Step::SetPose { y: Some(152), z: Some(110), hold_ms: 0 },
                Step::SetPose { y: Some(120), z: Some(110), hold_ms: 250 },
                Step::SetPose { y: Some(152), z: Some(110), hold_ms: 0 },
                Step::Terminal,
            ],
        }
    }

    /// Dubious scroll: drag down with two hesitation pauses of random
    /// length before finishing.
    pub fn dubious() -> Self {
        Self {
            base_delay_ms: 200,
            steps: vec![
                Step::SetPose { y: Some(145), z: Some(122), hold_ms: 0 },
                Step::SetPose { y: Some(125), z: Some(122), hold_ms: 0 },
                Step::SetPose { y: Some(122), z: Some(106), hold_ms: 0 },
                Step::RandomWait { min_ms: 500, max_ms: 2000 },
                Step::SetPose { y: Some(122), z: Some(134), hold_ms: 0 },
                Step::RandomWait { min_ms: 500, max_ms: 2000 },
                Step::SetPose { y: Some(122), z: Some(106), hold_ms: 0 },
                Step::SetPose { y: Some(145), z: Some(122), hold_ms: 0 },
                Step::Terminal,
            ],
        }
    }
}

/// The full set of step tables the arbiter drives. Defaults reproduce the
/// recorded gestures; the config file may override any table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureTables {
    pub scroll: StepTable,
    pub like_double_tap: StepTable,
    pub like_long_press: StepTable,
    pub dubious: StepTable,
}

impl Default for GestureTables {
    fn default() -> Self {
        Self {
            scroll: StepTable::scroll(),
            like_double_tap: StepTable::like_double_tap(),
            like_long_press: StepTable::like_long_press(),
            dubious: StepTable::dubious(),
        }
    }
}

impl GestureTables {
    /// The table for a Like variant.
    pub fn like(&self, variant: LikeVariant) -> &StepTable {
        match variant {
            LikeVariant::DoubleTap => &self.like_double_tap,
            LikeVariant::LongPress => &self.like_long_press,
        }
    }
}
