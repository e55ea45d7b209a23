//! Timing
//!
//! Monotonic millisecond clocks for the control loop.

pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};
