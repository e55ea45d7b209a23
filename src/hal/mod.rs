//! Hardware Abstraction
//!
//! Collaborator traits for the servo pair and potentiometers, plus loopback
//! implementations used by the binary's simulation mode and by tests. The
//! core never performs device I/O itself.

pub mod ports;
pub mod sim;

pub use ports::{Axis, PotBank, ServoBank};
pub use sim::{SimPotBank, SimServoBank};
