//! Control
//!
//! The per-tick arbiter deciding which driver owns the servos, and the
//! potentiometer passthrough it delegates to when no gesture runs.

pub mod arbiter;
pub mod passthrough;

pub use arbiter::Arbiter;
pub use passthrough::Passthrough;
