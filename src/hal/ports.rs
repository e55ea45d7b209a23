//! Device Ports
//!
//! The two external collaborators the core drives: an actuator bank of two
//! angular servos and a sensor bank of two potentiometers.

use serde::{Deserialize, Serialize};

/// Servo angle range, degrees.
pub const ANGLE_MIN: i32 = 0;
pub const ANGLE_MAX: i32 = 180;

/// Raw potentiometer reading range (10-bit ADC).
pub const POT_MAX: u16 = 1023;

/// Actuator/sensor channel selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// Vertical axis (thumb reach)
    Y,
    /// Lateral axis
    Z,
}

impl Axis {
    /// Array index for per-axis storage.
    #[inline]
    pub fn index(&self) -> usize {
        match self {
            Axis::Y => 0,
            Axis::Z => 1,
        }
    }
}

/// Servo pair collaborator.
///
/// `write` is idempotent and fire-and-forget; the core observes no return
/// value. Re-issuing an unchanged angle is permitted (the interpolator does
/// so deliberately to keep the actuator refreshed).
pub trait ServoBank {
    /// Command one servo to `degrees`. Callers clamp to [`ANGLE_MIN`],
    /// [`ANGLE_MAX`] before calling.
    fn write(&mut self, axis: Axis, degrees: i32);
}

/// Potentiometer pair collaborator.
///
/// Polled, never pushed. Readings are raw ADC counts in `0..=POT_MAX`.
pub trait PotBank {
    /// Read the current raw value of one channel.
    fn read(&self, axis: Axis) -> u16;
}

/// Clamp an angle into the servo range.
#[inline]
pub fn clamp_angle(degrees: i32) -> i32 {
    degrees.clamp(ANGLE_MIN, ANGLE_MAX)
}

/// Map a raw potentiometer reading onto the servo angle range.
///
/// Integer mapping matching the classic `map(value, 0, 1023, 0, 180)`
/// (truncating division).
#[inline]
pub fn pot_to_angle(raw: u16) -> i32 {
    let raw = raw.min(POT_MAX) as i32;
    raw * ANGLE_MAX / POT_MAX as i32
}
