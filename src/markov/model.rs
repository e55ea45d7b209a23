//! Transition Model
//!
//! Static per-state parameters fitted offline from interaction data: a
//! dwell-rate, an informational mean dwell, and a cumulative probability
//! table over the three actions. Loaded once, immutable at runtime.

use serde::{Deserialize, Serialize};

/// Hard ceiling on a sampled dwell, seconds.
pub const MAX_DWELL_SECS: f32 = 30.0;

/// Floor on a sampled dwell, seconds.
pub const MIN_DWELL_SECS: f32 = 0.1;

/// Floor applied to the uniform draw inside the dwell sampler.
const UNIFORM_FLOOR: f32 = 0.0001;

/// Draws this close to 1.0 short-circuit to the minimum dwell.
const UNIFORM_NEAR_ONE: f32 = 0.9999;

/// Process state: named after the gesture most recently performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SmmState {
    AfterScroll,
    AfterLike,
    AfterDubious,
}

impl SmmState {
    /// Array index for per-state counters.
    #[inline]
    pub fn index(&self) -> usize {
        match self {
            SmmState::AfterScroll => 0,
            SmmState::AfterLike => 1,
            SmmState::AfterDubious => 2,
        }
    }

    /// Name used in log lines.
    pub fn name(&self) -> &'static str {
        match self {
            SmmState::AfterScroll => "after_scroll",
            SmmState::AfterLike => "after_like",
            SmmState::AfterDubious => "after_dubious",
        }
    }
}

/// Action selected at the end of a dwell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Scroll,
    Like,
    DubiousScroll,
}

impl Action {
    /// The state the process enters after performing this action.
    pub fn resulting_state(&self) -> SmmState {
        match self {
            Action::Scroll => SmmState::AfterScroll,
            Action::Like => SmmState::AfterLike,
            Action::DubiousScroll => SmmState::AfterDubious,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Action::Scroll => "scroll",
            Action::Like => "like",
            Action::DubiousScroll => "dubious_scroll",
        }
    }
}

/// Fitted parameters for one state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateParams {
    /// Dwell-rate parameter fed to the sampler
    pub dwell_rate: f32,
    /// Mean dwell in seconds; informational, logged alongside samples
    pub mean_dwell: f32,
    /// Cumulative probability threshold for Scroll
    pub cum_scroll: f32,
    /// Cumulative probability threshold for Like (>= `cum_scroll`);
    /// anything above falls through to DubiousScroll
    pub cum_like: f32,
}

impl Default for StateParams {
    fn default() -> Self {
        // Offline fit defaults: mean dwell 2 s, transition probabilities
        // {scroll: 0.6, like: 0.2, dubious: 0.2}.
        Self {
            dwell_rate: 0.5,
            mean_dwell: 2.0,
            cum_scroll: 0.6,
            cum_like: 0.8,
        }
    }
}

/// Per-state parameter set
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TransitionModel {
    pub after_scroll: StateParams,
    pub after_like: StateParams,
    pub after_dubious: StateParams,
}

impl TransitionModel {
    /// Parameters for one state.
    #[inline]
    pub fn params(&self, state: SmmState) -> &StateParams {
        match state {
            SmmState::AfterScroll => &self.after_scroll,
            SmmState::AfterLike => &self.after_like,
            SmmState::AfterDubious => &self.after_dubious,
        }
    }
}

/// Sample a dwell time in seconds from a uniform draw `u` in (0, 1].
///
/// Deliberately simplified stand-in for an exponential draw: `(1 - u) /
/// rate` rather than `-ln(u) / rate`. The fitted parameters were tuned
/// against this approximation, so it is reproduced exactly; substituting
/// the exact inverse CDF would change observed dwell statistics.
pub fn sample_dwell_from(u: f32, rate: f32) -> f32 {
    let u = u.max(UNIFORM_FLOOR);

    let sample = if u > UNIFORM_NEAR_ONE {
        MIN_DWELL_SECS
    } else {
        (1.0 - u) / rate
    };

    sample.clamp(MIN_DWELL_SECS, MAX_DWELL_SECS)
}

/// Select the next action from a uniform draw `r` in (0, 1).
///
/// Strict less-than against the cumulative thresholds in order
/// {Scroll, Like}, falling through to DubiousScroll.
pub fn select_next_action(params: &StateParams, r: f32) -> Action {
    if r < params.cum_scroll {
        Action::Scroll
    } else if r < params.cum_like {
        Action::Like
    } else {
        Action::DubiousScroll
    }
}
