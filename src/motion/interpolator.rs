//! Linear Motion Interpolation
//!
//! Converts a (start, target, duration) request into intermediate servo
//! commands, advanced by polling current time. Interpolation truncates
//! toward the start value; the final committed pose always equals the
//! requested target exactly, so no drift accumulates across moves.

use crate::hal::ports::{clamp_angle, Axis, ServoBank};
use tracing::trace;

/// An in-flight move. Immutable once created; superseded when the move
/// completes or a new move begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionRequest {
    pub start_y: i32,
    pub start_z: i32,
    pub target_y: i32,
    pub target_z: i32,
    pub duration_ms: u64,
    pub started_at_ms: u64,
}

/// Poll-driven linear interpolator for the servo pair.
///
/// Owns the current pose while a move is in progress. Every in-progress
/// tick issues servo writes even when the computed angles are unchanged,
/// keeping the actuator refreshed.
#[derive(Debug)]
pub struct MotionInterpolator {
    current_y: i32,
    current_z: i32,
    request: Option<MotionRequest>,
}

impl MotionInterpolator {
    /// Create an interpolator at the given initial pose.
    pub fn new(initial_y: i32, initial_z: i32) -> Self {
        Self {
            current_y: clamp_angle(initial_y),
            current_z: clamp_angle(initial_z),
            request: None,
        }
    }

    /// Whether a move is currently in progress.
    #[inline]
    pub fn in_progress(&self) -> bool {
        self.request.is_some()
    }

    /// Current pose as (y, z) degrees.
    #[inline]
    pub fn current(&self) -> (i32, i32) {
        (self.current_y, self.current_z)
    }

    /// Overwrite the current pose without interpolating. Used when another
    /// driver (passthrough or an instant gesture step) commands the servos
    /// directly, so the next glide starts from the true pose.
    pub fn set_current(&mut self, y: i32, z: i32) {
        self.current_y = clamp_angle(y);
        self.current_z = clamp_angle(z);
    }

    /// Cancel any in-flight move, leaving the pose wherever it got to.
    pub fn abort(&mut self) {
        self.request = None;
    }

    /// Begin a new move. Captures the current pose as the start, records
    /// the request and marks the move in progress. A move already in
    /// flight is superseded.
    pub fn begin_move(&mut self, target_y: i32, target_z: i32, duration_ms: u64, now_ms: u64) {
        let request = MotionRequest {
            start_y: self.current_y,
            start_z: self.current_z,
            target_y: clamp_angle(target_y),
            target_z: clamp_angle(target_z),
            duration_ms,
            started_at_ms: now_ms,
        };
        trace!(?request, "begin move");
        self.request = Some(request);
    }

    /// Advance the move. Call once per control-loop iteration.
    ///
    /// No-op when idle. Snaps to the exact target once the duration has
    /// elapsed (immediately for a zero-duration move).
    pub fn tick<S: ServoBank>(&mut self, now_ms: u64, servos: &mut S) {
        let Some(req) = self.request else {
            return;
        };

        let elapsed = now_ms.saturating_sub(req.started_at_ms);

        if elapsed >= req.duration_ms {
            // Exact endpoint: removes cumulative interpolation error.
            self.current_y = req.target_y;
            self.current_z = req.target_z;
            servos.write(Axis::Y, self.current_y);
            servos.write(Axis::Z, self.current_z);
            self.request = None;
            return;
        }

        // duration_ms > elapsed >= 0 here, so the division is safe.
        let progress = elapsed as f32 / req.duration_ms as f32;

        // Truncation toward the start value, not rounding.
        self.current_y = req.start_y + ((req.target_y - req.start_y) as f32 * progress) as i32;
        self.current_z = req.start_z + ((req.target_z - req.start_z) as f32 * progress) as i32;

        servos.write(Axis::Y, self.current_y);
        servos.write(Axis::Z, self.current_z);
    }
}
