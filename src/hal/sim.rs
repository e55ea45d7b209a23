//! Loopback Devices
//!
//! In-memory servo and potentiometer banks. The binary runs against these
//! when no real hardware is attached; integration tests use them to observe
//! every commanded angle.

use super::ports::{Axis, PotBank, ServoBank};
use tracing::debug;

/// Servo bank that records every write.
///
/// Keeps the last commanded pose per axis and, optionally, the full write
/// history for assertions.
#[derive(Debug, Default)]
pub struct SimServoBank {
    last: [Option<i32>; 2],
    history: Vec<(Axis, i32)>,
    record_history: bool,
    writes: usize,
}

impl SimServoBank {
    /// Loopback bank that only tracks the latest pose.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loopback bank that also keeps the full write history.
    pub fn recording() -> Self {
        Self {
            record_history: true,
            ..Self::default()
        }
    }

    /// Last commanded angle for an axis, if any write happened.
    pub fn last(&self, axis: Axis) -> Option<i32> {
        self.last[axis.index()]
    }

    /// All writes issued so far, in order. Empty unless constructed with
    /// [`SimServoBank::recording`].
    pub fn history(&self) -> &[(Axis, i32)] {
        &self.history
    }

    /// Number of writes issued so far (counted even without history).
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl ServoBank for SimServoBank {
    fn write(&mut self, axis: Axis, degrees: i32) {
        debug!(?axis, degrees, "servo write");
        self.last[axis.index()] = Some(degrees);
        self.writes += 1;
        if self.record_history {
            self.history.push((axis, degrees));
        }
    }
}

/// Potentiometer bank returning fixed, settable readings.
#[derive(Debug)]
pub struct SimPotBank {
    raw: [u16; 2],
}

impl SimPotBank {
    /// Both channels centered (raw 512 ≈ 90°).
    pub fn centered() -> Self {
        Self { raw: [512, 512] }
    }

    /// Fixed readings per channel.
    pub fn with_values(y: u16, z: u16) -> Self {
        Self { raw: [y, z] }
    }

    /// Change the reading a channel will report.
    pub fn set(&mut self, axis: Axis, raw: u16) {
        self.raw[axis.index()] = raw;
    }
}

impl PotBank for SimPotBank {
    fn read(&self, axis: Axis) -> u16 {
        self.raw[axis.index()]
    }
}
