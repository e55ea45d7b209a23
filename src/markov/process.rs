//! Semi-Markov Execution
//!
//! Two phases per cycle: dwelling ("watching" for a sampled duration) and
//! acting (selecting the next gesture from the cumulative table). The
//! arbiter only ticks the process when no gesture is active and
//! passthrough is disabled, so an in-progress gesture is never
//! interrupted.

use crate::gesture::steps::LikeVariant;
use crate::markov::model::{
    sample_dwell_from, select_next_action, Action, SmmState, TransitionModel,
};
use rand::Rng;
use tracing::info;

/// How often (in autonomous actions) the aggregate statistics are logged.
const STATS_EVERY: u64 = 10;

/// An action chosen at the end of a dwell, for the arbiter to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionFired {
    pub action: Action,
    /// Fair-coin variant choice, present only when `action` is Like.
    pub like_variant: Option<LikeVariant>,
}

/// The semi-Markov gesture selection process.
///
/// Lives for the process lifetime; phase and statistics are reset only via
/// the explicit [`SemiMarkovProcess::reset`], never implicitly.
#[derive(Debug)]
pub struct SemiMarkovProcess {
    model: TransitionModel,
    current_state: SmmState,
    waiting: bool,
    wait_start_ms: u64,
    wait_duration_ms: u64,
    started_at_ms: u64,
    event_counter: u64,
    total_dwell_secs: f32,
    dwell_by_state: [f32; 3],
    transitions: [u64; 3],
}

impl SemiMarkovProcess {
    /// Create the process in `AfterScroll`, the conventional start state.
    pub fn new(model: TransitionModel) -> Self {
        Self {
            model,
            current_state: SmmState::AfterScroll,
            waiting: false,
            wait_start_ms: 0,
            wait_duration_ms: 0,
            started_at_ms: 0,
            event_counter: 0,
            total_dwell_secs: 0.0,
            dwell_by_state: [0.0; 3],
            transitions: [0; 3],
        }
    }

    #[inline]
    pub fn current_state(&self) -> SmmState {
        self.current_state
    }

    /// Whether the process is inside a dwell.
    #[inline]
    pub fn is_waiting(&self) -> bool {
        self.waiting
    }

    /// The armed dwell deadline in milliseconds, when waiting.
    #[inline]
    pub fn wait_duration_ms(&self) -> u64 {
        self.wait_duration_ms
    }

    /// Total autonomous actions fired so far.
    #[inline]
    pub fn event_count(&self) -> u64 {
        self.event_counter
    }

    /// Per-state transition counters, indexed by [`SmmState::index`].
    #[inline]
    pub fn transitions(&self) -> &[u64; 3] {
        &self.transitions
    }

    /// Accumulated dwell per state, seconds.
    #[inline]
    pub fn dwell_by_state(&self) -> &[f32; 3] {
        &self.dwell_by_state
    }

    /// Total accumulated dwell across all states, seconds.
    #[inline]
    pub fn total_dwell_secs(&self) -> f32 {
        self.total_dwell_secs
    }

    /// Re-anchor the simulation clock and drop any armed dwell. Called
    /// when autonomous mode is switched on; statistics are preserved.
    pub fn restart(&mut self, now_ms: u64) {
        self.started_at_ms = now_ms;
        self.waiting = false;
    }

    /// Full reset: initial state, phase cleared, statistics zeroed.
    pub fn reset(&mut self, now_ms: u64) {
        self.current_state = SmmState::AfterScroll;
        self.waiting = false;
        self.wait_start_ms = 0;
        self.wait_duration_ms = 0;
        self.started_at_ms = now_ms;
        self.event_counter = 0;
        self.total_dwell_secs = 0.0;
        self.dwell_by_state = [0.0; 3];
        self.transitions = [0; 3];
    }

    /// Advance one phase. Non-blocking; returns the fired action when a
    /// dwell deadline has passed.
    pub fn tick<R: Rng>(&mut self, now_ms: u64, rng: &mut R) -> Option<ActionFired> {
        if !self.waiting {
            self.begin_dwell(now_ms, rng);
            return None;
        }

        if now_ms.saturating_sub(self.wait_start_ms) < self.wait_duration_ms {
            return None;
        }

        self.waiting = false;
        Some(self.fire_action(now_ms, rng))
    }

    fn begin_dwell<R: Rng>(&mut self, now_ms: u64, rng: &mut R) {
        let params = self.model.params(self.current_state);
        let u: f32 = rng.gen();
        let dwell_secs = sample_dwell_from(u, params.dwell_rate);

        self.total_dwell_secs += dwell_secs;
        self.dwell_by_state[self.current_state.index()] += dwell_secs;

        info!(
            state = self.current_state.name(),
            dwell_secs = format_args!("{dwell_secs:.3}"),
            expected_secs = format_args!("{:.1}", params.mean_dwell),
            "watching"
        );

        self.wait_start_ms = now_ms;
        self.wait_duration_ms = (dwell_secs * 1000.0) as u64;
        self.waiting = true;
    }

    fn fire_action<R: Rng>(&mut self, now_ms: u64, rng: &mut R) -> ActionFired {
        let params = self.model.params(self.current_state);
        let r: f32 = rng.gen();
        let action = select_next_action(params, r);

        // Counter records the pre-transition state.
        self.transitions[self.current_state.index()] += 1;
        self.event_counter += 1;

        let like_variant = match action {
            Action::Like => Some(if rng.gen_bool(0.5) {
                LikeVariant::LongPress
            } else {
                LikeVariant::DoubleTap
            }),
            _ => None,
        };

        let elapsed_secs = now_ms.saturating_sub(self.started_at_ms) as f32 / 1000.0;
        info!(
            elapsed_secs = format_args!("{elapsed_secs:.3}"),
            event = self.event_counter,
            from_state = self.current_state.name(),
            action = action.name(),
            variant = like_variant.map(|v| v as u8),
            "smm action"
        );

        self.current_state = action.resulting_state();

        if self.event_counter % STATS_EVERY == 0 {
            info!(
                after_scroll = self.transitions[SmmState::AfterScroll.index()],
                after_like = self.transitions[SmmState::AfterLike.index()],
                after_dubious = self.transitions[SmmState::AfterDubious.index()],
                "smm statistics: state transitions"
            );
        }

        ActionFired { action, like_variant }
    }
}
