//! Gesture Sequencer
//!
//! One time-gated state machine per gesture kind, all driven by the same
//! step-table logic. `tick` is non-blocking: it executes at most one step
//! per call and only once the inter-step gate has elapsed. The arbiter
//! guarantees at most one sequencer is active system-wide.

use crate::gesture::steps::{GestureKind, Step, StepTable};
use crate::hal::ports::{clamp_angle, Axis, ServoBank};
use crate::motion::interpolator::MotionInterpolator;
use rand::Rng;
use tracing::{error, info};

/// Reported once when a gesture reaches its terminal step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    /// Gesture that finished
    pub kind: GestureKind,
    /// Whether completion permanently latches manual potentiometer
    /// control off (Like and Dubious; not Scroll)
    pub disables_manual: bool,
}

/// Step-table driver for a single gesture kind.
#[derive(Debug)]
pub struct Sequencer {
    kind: GestureKind,
    table: StepTable,
    latches_manual: bool,
    active: bool,
    step_index: usize,
    last_step_at_ms: u64,
    /// Gate before the current step may execute: the table's base delay,
    /// or a pose hold override from the previous step.
    gate_ms: u64,
    /// Armed wait (fixed or sampled), consumed exactly once.
    armed_wait_ms: Option<u64>,
}

impl Sequencer {
    /// Create an inactive sequencer for `kind` over `table`.
    ///
    /// `latches_manual` marks gestures whose completion permanently
    /// disables potentiometer passthrough.
    pub fn new(kind: GestureKind, table: StepTable, latches_manual: bool) -> Self {
        Self {
            kind,
            table,
            latches_manual,
            active: false,
            step_index: 0,
            last_step_at_ms: 0,
            gate_ms: 0,
            armed_wait_ms: None,
        }
    }

    /// Whether this gesture is currently running.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Current step index (always within `0..table.len()` while active).
    #[inline]
    pub fn step_index(&self) -> usize {
        self.step_index
    }

    /// The armed wait duration, if a wait step is in progress.
    #[inline]
    pub fn armed_wait_ms(&self) -> Option<u64> {
        self.armed_wait_ms
    }

    /// Swap the step table. Only meaningful while inactive (used to pick a
    /// Like variant before starting).
    pub fn replace_table(&mut self, table: StepTable) {
        debug_assert!(!self.active, "table swapped while gesture active");
        self.table = table;
    }

    /// Begin the gesture: step 0, active, transient state cleared. The
    /// first step is gated by the table's base delay, measured from `now`.
    pub fn start(&mut self, now_ms: u64) {
        self.active = true;
        self.step_index = 0;
        self.last_step_at_ms = now_ms;
        self.gate_ms = self.table.base_delay_ms;
        self.armed_wait_ms = None;
        info!(gesture = self.kind.name(), "gesture started");
    }

    /// Execute at most one step. Returns the completion record when the
    /// terminal step runs.
    pub fn tick<R: Rng, S: ServoBank>(
        &mut self,
        now_ms: u64,
        rng: &mut R,
        servos: &mut S,
        interp: &mut MotionInterpolator,
    ) -> Option<Completion> {
        if !self.active {
            return None;
        }

        // A glide in flight gates advancement; the arbiter keeps ticking
        // the interpolator until it completes.
        if interp.in_progress() {
            return None;
        }

        if now_ms.saturating_sub(self.last_step_at_ms) < self.gate_ms {
            return None;
        }

        // Internal-consistency guard: an index at or past the table end is
        // recovered locally, never read out of bounds.
        if self.step_index >= self.table.len() {
            error!(
                gesture = self.kind.name(),
                step = self.step_index,
                len = self.table.len(),
                "step index out of bounds; deactivating"
            );
            self.deactivate();
            return None;
        }

        let step = self.table.steps[self.step_index];
        match step {
            Step::Glide { y, z, duration_ms } => {
                info!(
                    gesture = self.kind.name(),
                    step = self.step_index + 1,
                    y,
                    z,
                    duration_ms,
                    "glide"
                );
                interp.begin_move(y, z, duration_ms, now_ms);
                self.advance(now_ms, self.table.base_delay_ms);
            }
            Step::SetPose { y, z, hold_ms } => {
                let (cur_y, cur_z) = interp.current();
                let new_y = y.map(clamp_angle).unwrap_or(cur_y);
                let new_z = z.map(clamp_angle).unwrap_or(cur_z);
                if y.is_some() {
                    servos.write(Axis::Y, new_y);
                }
                if z.is_some() {
                    servos.write(Axis::Z, new_z);
                }
                // Keep the interpolator's pose truthful for later glides.
                interp.set_current(new_y, new_z);
                info!(
                    gesture = self.kind.name(),
                    step = self.step_index + 1,
                    y = new_y,
                    z = new_z,
                    "pose"
                );
                self.advance(now_ms, self.table.base_delay_ms.max(hold_ms));
            }
            Step::FixedWait { ms } => {
                if self.wait_elapsed_or_arm(now_ms, ms) {
                    self.advance(now_ms, self.table.base_delay_ms);
                }
            }
            Step::RandomWait { min_ms, max_ms } => {
                let armed = match self.armed_wait_ms {
                    Some(ms) => ms,
                    None => {
                        let sampled = rng.gen_range(min_ms..=max_ms);
                        info!(
                            gesture = self.kind.name(),
                            step = self.step_index + 1,
                            wait_ms = sampled,
                            "waiting"
                        );
                        self.armed_wait_ms = Some(sampled);
                        self.last_step_at_ms = now_ms;
                        return None;
                    }
                };
                if now_ms.saturating_sub(self.last_step_at_ms) >= armed {
                    self.armed_wait_ms = None;
                    self.advance(now_ms, self.table.base_delay_ms);
                }
            }
            Step::Terminal => {
                info!(gesture = self.kind.name(), "gesture complete");
                if self.latches_manual {
                    info!("manual potentiometer control permanently disabled");
                }
                let completion = Completion {
                    kind: self.kind,
                    disables_manual: self.latches_manual,
                };
                self.deactivate();
                return Some(completion);
            }
        }

        None
    }

    /// Arm a fixed wait on first visit; report whether it has elapsed.
    fn wait_elapsed_or_arm(&mut self, now_ms: u64, ms: u64) -> bool {
        match self.armed_wait_ms {
            None => {
                self.armed_wait_ms = Some(ms);
                self.last_step_at_ms = now_ms;
                false
            }
            Some(armed) => {
                if now_ms.saturating_sub(self.last_step_at_ms) >= armed {
                    self.armed_wait_ms = None;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Cancel the gesture immediately (reset command path).
    pub fn abort(&mut self) {
        if self.active {
            info!(gesture = self.kind.name(), "gesture aborted");
        }
        self.deactivate();
    }

    fn advance(&mut self, now_ms: u64, gate_ms: u64) {
        self.step_index += 1;
        self.last_step_at_ms = now_ms;
        self.gate_ms = gate_ms;
    }

    fn deactivate(&mut self) {
        self.active = false;
        self.step_index = 0;
        self.armed_wait_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::steps::StepTable;
    use crate::hal::sim::SimServoBank;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct Rig {
        rng: StdRng,
        servos: SimServoBank,
        interp: MotionInterpolator,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                rng: StdRng::seed_from_u64(42),
                servos: SimServoBank::new(),
                interp: MotionInterpolator::new(180, 0),
            }
        }

        fn tick(&mut self, seq: &mut Sequencer, now: u64) -> Option<Completion> {
            // Matches the arbiter's per-tick order: interpolator first.
            self.interp.tick(now, &mut self.servos);
            seq.tick(now, &mut self.rng, &mut self.servos, &mut self.interp)
        }
    }

    fn like_seq() -> Sequencer {
        Sequencer::new(GestureKind::Like, StepTable::like_double_tap(), true)
    }

    #[test]
    fn test_inactive_tick_is_noop() {
        let mut rig = Rig::new();
        let mut seq = like_seq();
        assert_eq!(rig.tick(&mut seq, 0), None);
        assert_eq!(rig.servos.write_count(), 0);
    }

    #[test]
    fn test_step_advance_is_time_gated() {
        let mut rig = Rig::new();
        let mut seq = like_seq();
        seq.start(0);

        // Base delay is 100 ms: two ticks inside the gate do nothing.
        rig.tick(&mut seq, 10);
        rig.tick(&mut seq, 99);
        assert_eq!(seq.step_index(), 0);
        assert_eq!(rig.servos.write_count(), 0);

        rig.tick(&mut seq, 100);
        assert_eq!(seq.step_index(), 1);
        assert_eq!(rig.servos.last(Axis::Y), Some(140));
        assert_eq!(rig.servos.last(Axis::Z), Some(120));
    }

    #[test]
    fn test_double_tick_same_instant_does_not_double_advance() {
        let mut rig = Rig::new();
        let mut seq = like_seq();
        seq.start(0);
        rig.tick(&mut seq, 100);
        rig.tick(&mut seq, 100);
        assert_eq!(seq.step_index(), 1, "second tick inside gate must not advance");
    }

    #[test]
    fn test_pose_hold_extends_gate() {
        let mut rig = Rig::new();
        let mut seq = like_seq();
        seq.start(0);
        rig.tick(&mut seq, 100); // step 1: pose (140, 120)
        rig.tick(&mut seq, 200); // step 2: press y=120, hold 100

        assert_eq!(rig.servos.last(Axis::Y), Some(120));
        // hold_ms = 100 equals base delay here; next step gated until 300.
        rig.tick(&mut seq, 299);
        assert_eq!(seq.step_index(), 2);
        rig.tick(&mut seq, 300);
        assert_eq!(seq.step_index(), 3);
        assert_eq!(rig.servos.last(Axis::Y), Some(140));
    }

    #[test]
    fn test_long_press_hold_overrides_base_delay() {
        let mut rig = Rig::new();
        let mut seq = Sequencer::new(GestureKind::Like, StepTable::like_long_press(), true);
        seq.start(0);
        rig.tick(&mut seq, 100); // pose (152, 110)
        rig.tick(&mut seq, 200); // press (120, 110), hold 250

        // Base delay is 100 but the press holds for 250.
        rig.tick(&mut seq, 449);
        assert_eq!(rig.servos.last(Axis::Y), Some(120));
        rig.tick(&mut seq, 450);
        assert_eq!(rig.servos.last(Axis::Y), Some(152));
    }

    #[test]
    fn test_like_completion_latches_manual_off() {
        let mut rig = Rig::new();
        let mut seq = Sequencer::new(GestureKind::Like, StepTable::like_long_press(), true);
        seq.start(0);

        let mut completion = None;
        let mut now = 0;
        for _ in 0..100 {
            now += 100;
            if let Some(c) = rig.tick(&mut seq, now) {
                completion = Some(c);
                break;
            }
        }

        let completion = completion.expect("gesture should complete");
        assert_eq!(completion.kind, GestureKind::Like);
        assert!(completion.disables_manual);
        assert!(!seq.is_active());
        assert_eq!(seq.step_index(), 0, "reset to step 0 on completion");
    }

    #[test]
    fn test_scroll_glides_gated_by_interpolator() {
        let mut rig = Rig::new();
        let mut seq = Sequencer::new(GestureKind::Scroll, StepTable::scroll(), false);
        seq.start(0);

        rig.tick(&mut seq, 0); // starts glide 1 (duration 200)
        assert_eq!(seq.step_index(), 1);
        assert!(rig.interp.in_progress());

        // Glide still in flight: no advancement.
        rig.tick(&mut seq, 100);
        assert_eq!(seq.step_index(), 1);

        // Glide completes at 200; the same tick may then start glide 2.
        rig.tick(&mut seq, 200);
        assert_eq!(rig.servos.last(Axis::Y), Some(142));
        assert_eq!(seq.step_index(), 2);
    }

    #[test]
    fn test_scroll_completion_does_not_latch() {
        let mut rig = Rig::new();
        let mut seq = Sequencer::new(GestureKind::Scroll, StepTable::scroll(), false);
        seq.start(0);

        let mut completion = None;
        let mut now = 0;
        for _ in 0..200 {
            now += 50;
            if let Some(c) = rig.tick(&mut seq, now) {
                completion = Some(c);
                break;
            }
        }

        let completion = completion.expect("scroll should complete");
        assert!(!completion.disables_manual);
        // Final scroll pose is the last glide target.
        assert_eq!(rig.interp.current(), (147, 100));
    }

    #[test]
    fn test_random_wait_arms_once_and_stays_in_range() {
        let mut rig = Rig::new();
        let mut seq = Sequencer::new(GestureKind::Dubious, StepTable::dubious(), true);
        seq.start(0);

        // Drive through the three opening poses (base delay 200).
        let mut now = 0;
        for _ in 0..3 {
            now += 200;
            rig.tick(&mut seq, now);
        }
        assert_eq!(seq.step_index(), 3);

        // Arming tick: samples but does not advance.
        now += 200;
        rig.tick(&mut seq, now);
        let armed = seq.armed_wait_ms().expect("wait should be armed");
        assert!((500..=2000).contains(&armed));
        assert_eq!(seq.step_index(), 3);

        // Repeated ticks before the deadline must not re-sample or advance.
        rig.tick(&mut seq, now + armed / 2);
        assert_eq!(seq.armed_wait_ms(), Some(armed));
        assert_eq!(seq.step_index(), 3);

        // Deadline reached: armed value consumed, step advances.
        rig.tick(&mut seq, now + armed);
        assert_eq!(seq.armed_wait_ms(), None);
        assert_eq!(seq.step_index(), 4);
    }

    #[test]
    fn test_dubious_random_waits_sample_independently() {
        // Run the full gesture twice with different seeds and collect the
        // armed values; both waits must come from fresh draws.
        let mut samples = Vec::new();
        for seed in [1u64, 99] {
            let mut rig = Rig::new();
            rig.rng = StdRng::seed_from_u64(seed);
            let mut seq = Sequencer::new(GestureKind::Dubious, StepTable::dubious(), true);
            seq.start(0);

            let mut now = 0;
            let mut last_armed = None;
            for _ in 0..500 {
                now += 100;
                rig.tick(&mut seq, now);
                if seq.armed_wait_ms() != last_armed {
                    if let Some(v) = seq.armed_wait_ms() {
                        samples.push(v);
                    }
                    last_armed = seq.armed_wait_ms();
                }
                if !seq.is_active() && seq.step_index() == 0 && now > 100 {
                    break;
                }
            }
        }
        assert_eq!(samples.len(), 4, "two waits per run, two runs");
        for v in &samples {
            assert!((500..=2000).contains(v));
        }
    }

    #[test]
    fn test_out_of_bounds_index_recovers_locally() {
        // A malformed table with no terminal marker walks past the end;
        // the guard must clamp and deactivate instead of panicking.
        let table = StepTable {
            base_delay_ms: 10,
            steps: vec![Step::SetPose { y: Some(90), z: Some(90), hold_ms: 0 }],
        };
        let mut rig = Rig::new();
        let mut seq = Sequencer::new(GestureKind::Like, table, true);
        seq.start(0);

        rig.tick(&mut seq, 10); // executes the only step, index -> 1
        assert_eq!(seq.step_index(), 1);
        assert_eq!(rig.tick(&mut seq, 20), None);
        assert!(!seq.is_active(), "guard must deactivate");
        assert_eq!(seq.step_index(), 0);
    }

    #[test]
    fn test_restart_resets_transient_state() {
        let mut rig = Rig::new();
        let mut seq = Sequencer::new(GestureKind::Dubious, StepTable::dubious(), true);
        seq.start(0);
        let mut now = 0;
        for _ in 0..4 {
            now += 200;
            rig.tick(&mut seq, now);
        }
        assert!(seq.armed_wait_ms().is_some());

        seq.start(now);
        assert_eq!(seq.step_index(), 0);
        assert_eq!(seq.armed_wait_ms(), None);
        assert!(seq.is_active());
    }
}
