//! Control Loop Arbiter
//!
//! Single-threaded priority scheduler. Each tick, exactly one of
//! {pending manual trigger, active gesture, potentiometer passthrough,
//! semi-Markov process} owns the servo pair:
//!
//! 1. a pending manual trigger starts its gesture (if none is active);
//! 2. an active gesture is driven, and nothing else runs this tick;
//! 3. passthrough runs while it is still enabled;
//! 4. the semi-Markov process runs in autonomous mode once passthrough
//!    is disabled.
//!
//! The reset command clears everything and re-enables passthrough.

use crate::control::passthrough::Passthrough;
use crate::gesture::sequencer::Sequencer;
use crate::gesture::steps::{GestureKind, GestureTables, LikeVariant};
use crate::hal::ports::{PotBank, ServoBank};
use crate::markov::model::{Action, TransitionModel};
use crate::markov::process::SemiMarkovProcess;
use crate::motion::interpolator::MotionInterpolator;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

/// Servo pose commanded at startup and assumed by the first glide.
pub const INITIAL_POSE: (i32, i32) = (180, 0);

/// Per-tick owner arbitration over the servo pair.
pub struct Arbiter {
    tables: GestureTables,
    interp: MotionInterpolator,
    scroll: Sequencer,
    like: Sequencer,
    dubious: Sequencer,
    passthrough: Passthrough,
    smm: SemiMarkovProcess,
    rng: StdRng,
    /// Manual trigger queued by the command interface, consumed at the
    /// top of a tick.
    pending: Option<(GestureKind, LikeVariant)>,
    /// Soft disable: set while gestures or autonomous mode own the
    /// servos; cleared when autonomous mode is toggled off.
    manual_disabled: bool,
    /// Permanent latch set by Like/Dubious completion; survives
    /// autonomous toggles, cleared only by reset.
    manual_latched: bool,
    autonomous: bool,
}

impl Arbiter {
    /// Build the arbiter from static configuration and an RNG seed.
    pub fn new(tables: GestureTables, model: TransitionModel, seed: u64) -> Self {
        let scroll = Sequencer::new(GestureKind::Scroll, tables.scroll.clone(), false);
        let like = Sequencer::new(GestureKind::Like, tables.like_double_tap.clone(), true);
        let dubious = Sequencer::new(GestureKind::Dubious, tables.dubious.clone(), true);
        Self {
            tables,
            interp: MotionInterpolator::new(INITIAL_POSE.0, INITIAL_POSE.1),
            scroll,
            like,
            dubious,
            passthrough: Passthrough::new(),
            smm: SemiMarkovProcess::new(model),
            rng: StdRng::seed_from_u64(seed),
            pending: None,
            manual_disabled: false,
            manual_latched: false,
            autonomous: false,
        }
    }

    /// The gesture currently running, if any.
    pub fn active_gesture(&self) -> Option<GestureKind> {
        if self.scroll.is_active() {
            Some(GestureKind::Scroll)
        } else if self.like.is_active() {
            Some(GestureKind::Like)
        } else if self.dubious.is_active() {
            Some(GestureKind::Dubious)
        } else {
            None
        }
    }

    /// Whether live potentiometer control currently owns the servos when
    /// no gesture is running.
    pub fn passthrough_enabled(&self) -> bool {
        !self.manual_disabled && !self.manual_latched
    }

    /// Whether autonomous (semi-Markov) mode is switched on.
    pub fn autonomous(&self) -> bool {
        self.autonomous
    }

    /// The semi-Markov process, for statistics inspection.
    pub fn smm(&self) -> &SemiMarkovProcess {
        &self.smm
    }

    /// Current servo pose as tracked by the motion layer.
    pub fn pose(&self) -> (i32, i32) {
        self.interp.current()
    }

    /// Queue a manual gesture trigger. Consumed at the top of the next
    /// tick, ignored there if a gesture is already active. Manual Like
    /// requests run the double-tap variant.
    pub fn request_gesture(&mut self, kind: GestureKind) {
        self.pending = Some((kind, LikeVariant::DoubleTap));
    }

    /// Toggle autonomous mode. Enabling latches manual control off and
    /// re-anchors the process clock; disabling restores passthrough
    /// unless a completed Like/Dubious has permanently latched it.
    pub fn set_autonomous(&mut self, enabled: bool, now_ms: u64) {
        self.autonomous = enabled;
        if enabled {
            info!("semi-markov mode activated");
            self.manual_disabled = true;
            self.smm.restart(now_ms);
        } else {
            info!("semi-markov mode deactivated");
            self.manual_disabled = false;
        }
    }

    /// Unconditional reset: abort any gesture and glide, clear the
    /// pending trigger and both disable flags, switch autonomous off, and
    /// zero the process statistics. Passthrough is enabled again.
    pub fn reset(&mut self, now_ms: u64) {
        self.scroll.abort();
        self.like.abort();
        self.dubious.abort();
        self.interp.abort();
        self.pending = None;
        self.autonomous = false;
        self.manual_disabled = false;
        self.manual_latched = false;
        self.smm.reset(now_ms);
        info!("system reset; manual control re-enabled");
    }

    /// One scheduling quantum.
    pub fn tick<S: ServoBank, P: PotBank>(&mut self, now_ms: u64, servos: &mut S, pots: &P) {
        // (1) Pending manual trigger, only when nothing is running.
        if self.active_gesture().is_none() {
            if let Some((kind, variant)) = self.pending.take() {
                self.start_gesture(kind, variant, now_ms);
            }
        } else {
            // Keep a stale request from firing mid-gesture.
            self.pending = None;
        }

        // (2) An active gesture owns the servos for the whole tick.
        if let Some(kind) = self.active_gesture() {
            if kind == GestureKind::Scroll {
                self.interp.tick(now_ms, servos);
            }
            let seq = match kind {
                GestureKind::Scroll => &mut self.scroll,
                GestureKind::Like => &mut self.like,
                GestureKind::Dubious => &mut self.dubious,
            };
            if let Some(completion) = seq.tick(now_ms, &mut self.rng, servos, &mut self.interp) {
                if completion.disables_manual {
                    self.manual_latched = true;
                }
            }
            return;
        }

        // (3) Live passthrough until a gesture or autonomous mode
        // disables it.
        if self.passthrough_enabled() {
            if let Some((y, z)) = self.passthrough.tick(pots, servos) {
                self.interp.set_current(y, z);
            }
            return;
        }

        // (4) Autonomous selection only runs with the servos idle and
        // passthrough off; it never interrupts a gesture.
        if self.autonomous {
            if let Some(fired) = self.smm.tick(now_ms, &mut self.rng) {
                let (kind, variant) = match fired.action {
                    Action::Scroll => (GestureKind::Scroll, LikeVariant::DoubleTap),
                    Action::Like => (
                        GestureKind::Like,
                        fired.like_variant.unwrap_or_default(),
                    ),
                    Action::DubiousScroll => (GestureKind::Dubious, LikeVariant::DoubleTap),
                };
                self.start_gesture(kind, variant, now_ms);
            }
        }
    }

    fn start_gesture(&mut self, kind: GestureKind, variant: LikeVariant, now_ms: u64) {
        self.manual_disabled = true;
        match kind {
            GestureKind::Scroll => self.scroll.start(now_ms),
            GestureKind::Like => {
                self.like.replace_table(self.tables.like(variant).clone());
                self.like.start(now_ms);
            }
            GestureKind::Dubious => self.dubious.start(now_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::sim::{SimPotBank, SimServoBank};

    fn arbiter() -> Arbiter {
        Arbiter::new(GestureTables::default(), TransitionModel::default(), 42)
    }

    fn run_until_idle(
        arb: &mut Arbiter,
        servos: &mut SimServoBank,
        pots: &SimPotBank,
        mut now: u64,
    ) -> u64 {
        for _ in 0..10_000 {
            now += 15;
            arb.tick(now, servos, pots);
            if arb.active_gesture().is_none() {
                return now;
            }
        }
        panic!("gesture never completed");
    }

    #[test]
    fn test_passthrough_runs_when_idle() {
        let mut arb = arbiter();
        let mut servos = SimServoBank::new();
        let pots = SimPotBank::centered();

        assert!(arb.passthrough_enabled());
        arb.tick(0, &mut servos, &pots);
        assert!(servos.write_count() > 0, "passthrough should drive servos");
    }

    #[test]
    fn test_manual_request_disables_passthrough_and_runs() {
        let mut arb = arbiter();
        let mut servos = SimServoBank::new();
        let pots = SimPotBank::centered();

        arb.request_gesture(GestureKind::Scroll);
        arb.tick(0, &mut servos, &pots);
        assert_eq!(arb.active_gesture(), Some(GestureKind::Scroll));
        assert!(!arb.passthrough_enabled());
    }

    #[test]
    fn test_gesture_excludes_passthrough_for_whole_tick() {
        let mut arb = arbiter();
        let mut servos = SimServoBank::new();
        let mut pots = SimPotBank::centered();

        arb.request_gesture(GestureKind::Like);
        arb.tick(0, &mut servos, &pots);
        let writes_at_start = servos.write_count();

        // Pot movement must be invisible while the gesture runs.
        pots.set(crate::hal::ports::Axis::Y, 0);
        arb.tick(10, &mut servos, &pots);
        assert_eq!(servos.write_count(), writes_at_start, "gate not yet elapsed, no writes");
    }

    #[test]
    fn test_request_ignored_while_gesture_active() {
        let mut arb = arbiter();
        let mut servos = SimServoBank::new();
        let pots = SimPotBank::centered();

        arb.request_gesture(GestureKind::Dubious);
        arb.tick(0, &mut servos, &pots);
        assert_eq!(arb.active_gesture(), Some(GestureKind::Dubious));

        arb.request_gesture(GestureKind::Scroll);
        arb.tick(15, &mut servos, &pots);
        assert_eq!(arb.active_gesture(), Some(GestureKind::Dubious));

        // The stale request must not fire after completion either.
        let now = run_until_idle(&mut arb, &mut servos, &pots, 15);
        arb.tick(now + 15, &mut servos, &pots);
        assert_eq!(arb.active_gesture(), None);
    }

    #[test]
    fn test_scroll_completion_keeps_manual_disabled_but_unlatched() {
        let mut arb = arbiter();
        let mut servos = SimServoBank::new();
        let pots = SimPotBank::centered();

        arb.request_gesture(GestureKind::Scroll);
        arb.tick(0, &mut servos, &pots);
        run_until_idle(&mut arb, &mut servos, &pots, 0);

        assert!(!arb.passthrough_enabled(), "soft disable persists");
        // Toggling autonomous off clears the soft disable; scroll set no
        // permanent latch.
        arb.set_autonomous(true, 0);
        arb.set_autonomous(false, 0);
        assert!(arb.passthrough_enabled());
    }

    #[test]
    fn test_like_completion_latch_survives_autonomous_toggle() {
        let mut arb = arbiter();
        let mut servos = SimServoBank::new();
        let pots = SimPotBank::centered();

        arb.request_gesture(GestureKind::Like);
        arb.tick(0, &mut servos, &pots);
        let now = run_until_idle(&mut arb, &mut servos, &pots, 0);

        assert!(!arb.passthrough_enabled());
        arb.set_autonomous(true, now);
        arb.set_autonomous(false, now);
        assert!(
            !arb.passthrough_enabled(),
            "latch must survive an unrelated autonomous toggle"
        );

        arb.reset(now);
        assert!(arb.passthrough_enabled(), "only reset clears the latch");
    }

    #[test]
    fn test_autonomous_cycle_starts_a_gesture() {
        let mut arb = arbiter();
        let mut servos = SimServoBank::new();
        let pots = SimPotBank::centered();

        arb.set_autonomous(true, 0);
        assert!(!arb.passthrough_enabled());

        // Drive until the first dwell expires and a gesture starts.
        let mut now = 0;
        let mut started = None;
        for _ in 0..10_000 {
            now += 15;
            arb.tick(now, &mut servos, &pots);
            if let Some(kind) = arb.active_gesture() {
                started = Some(kind);
                break;
            }
        }
        let started = started.expect("smm should fire within the max dwell");
        assert_eq!(arb.smm().event_count(), 1);
        // The process state matches the gesture it just launched.
        let expected = match started {
            GestureKind::Scroll => crate::markov::model::SmmState::AfterScroll,
            GestureKind::Like => crate::markov::model::SmmState::AfterLike,
            GestureKind::Dubious => crate::markov::model::SmmState::AfterDubious,
        };
        assert_eq!(arb.smm().current_state(), expected);
    }

    #[test]
    fn test_smm_never_interrupts_a_gesture() {
        let mut arb = arbiter();
        let mut servos = SimServoBank::new();
        let pots = SimPotBank::centered();

        arb.set_autonomous(true, 0);
        let mut now = 0;
        let mut events_at_start = None;
        for _ in 0..200_000 {
            now += 15;
            arb.tick(now, &mut servos, &pots);
            if arb.active_gesture().is_some() {
                let events = arb.smm().event_count();
                match events_at_start {
                    None => events_at_start = Some(events),
                    Some(e) => assert_eq!(events, e, "no smm event while a gesture runs"),
                }
            } else if events_at_start.is_some() {
                break;
            }
        }
        assert!(events_at_start.is_some());
    }

    #[test]
    fn test_reset_restores_everything() {
        let mut arb = arbiter();
        let mut servos = SimServoBank::new();
        let pots = SimPotBank::centered();

        arb.set_autonomous(true, 0);
        arb.request_gesture(GestureKind::Dubious);
        arb.tick(15, &mut servos, &pots);
        assert_eq!(arb.active_gesture(), Some(GestureKind::Dubious));

        arb.reset(30);
        assert_eq!(arb.active_gesture(), None);
        assert!(!arb.autonomous());
        assert!(arb.passthrough_enabled());
        assert_eq!(arb.smm().event_count(), 0);
    }
}
