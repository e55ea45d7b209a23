//! Monotonic Clock Facade
//!
//! All component timing is soft: elapsed-time comparisons against a
//! millisecond counter polled once per loop iteration. A stalled clock
//! source stalls all timing uniformly; there is no independent timeout
//! detector.

use std::time::Instant;

/// Source of control-loop time, in milliseconds since an arbitrary epoch.
///
/// Guaranteed monotonic: `now_ms` never decreases between calls.
pub trait Clock {
    /// Current time in milliseconds.
    fn now_ms(&self) -> u64;
}

/// Wall-clock backed monotonic clock.
///
/// Wraps `std::time::Instant`, anchored at construction. Millisecond
/// resolution is ample for gesture timing (shortest gate is 100 ms).
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    /// Create a clock anchored at the current instant.
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }
}

/// Hand-advanced clock for tests and simulation.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: std::cell::Cell<u64>,
}

impl ManualClock {
    /// Create a manual clock starting at `start_ms`.
    pub fn at(start_ms: u64) -> Self {
        Self {
            now: std::cell::Cell::new(start_ms),
        }
    }

    /// Advance the clock by `delta_ms`.
    pub fn advance(&self, delta_ms: u64) {
        self.now.set(self.now.get() + delta_ms);
    }

    /// Set the clock to an absolute time. Must not move backward.
    pub fn set(&self, now_ms: u64) {
        debug_assert!(now_ms >= self.now.get(), "manual clock moved backward");
        self.now.set(now_ms);
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic_clock_advances() {
        let clock = MonotonicClock::new();
        let t1 = clock.now_ms();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let t2 = clock.now_ms();
        assert!(t2 >= t1, "clock must be monotonic");
        assert!(t2 - t1 >= 4, "clock should track real time");
    }

    #[test]
    fn test_manual_clock_advance() {
        let clock = ManualClock::at(100);
        assert_eq!(clock.now_ms(), 100);
        clock.advance(50);
        assert_eq!(clock.now_ms(), 150);
        clock.set(1_000);
        assert_eq!(clock.now_ms(), 1_000);
    }

    #[test]
    fn test_manual_clock_default_starts_at_zero() {
        let clock = ManualClock::default();
        assert_eq!(clock.now_ms(), 0);
    }
}
