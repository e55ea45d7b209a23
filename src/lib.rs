//! # Gesture Driver
//!
//! A servo gesture emulation engine. Two angular actuators (Y and Z axes)
//! perform human-like gesture sequences on a touch surface, with the next
//! gesture chosen by a semi-Markov process whose dwell times are sampled
//! per state.
//!
//! ## Overview
//!
//! The engine is a single-threaded, cooperative control loop. Every
//! component exposes a non-blocking `tick` that is polled once per loop
//! iteration; timing is derived from monotonic elapsed-time comparisons,
//! never from sleeping inside a component.
//!
//! ## Architecture
//!
//! - [`time`]: monotonic clock facade (real and manual clocks)
//! - [`hal`]: servo/potentiometer collaborator traits and loopback sims
//! - [`motion`]: linear motion interpolation between servo poses
//! - [`gesture`]: step tables and the time-gated gesture sequencer
//! - [`markov`]: semi-Markov dwell/action process and transition model
//! - [`control`]: potentiometer passthrough and the per-tick arbiter
//! - [`app`]: CLI and configuration management
//!
//! ## Control Flow
//!
//! ```text
//! ┌─────────────┐    ┌─────────────┐    ┌──────────────┐    ┌─────────┐
//! │   Arbiter   │───▶│  Sequencer  │───▶│ Interpolator │───▶│  Servos │
//! │ (per tick)  │    │ (one active)│    │ (Scroll only)│    │  (Y, Z) │
//! └─────────────┘    └─────────────┘    └──────────────┘    └─────────┘
//!        │
//!        ├──▶ passthrough (pots → smoothing → servos), until latched off
//!        └──▶ semi-Markov process (dwell → action → start gesture)
//! ```
//!
//! Exactly one of {sequencer, passthrough, semi-Markov process} owns the
//! servo pair in a given tick; the arbiter's priority order makes the
//! mutual exclusion explicit.

pub mod time;
pub mod hal;
pub mod motion;
pub mod gesture;
pub mod markov;
pub mod control;
pub mod app;

// Re-export commonly used types
pub use control::arbiter::Arbiter;
pub use gesture::steps::{GestureKind, LikeVariant, Step};
pub use hal::ports::{Axis, PotBank, ServoBank};
pub use markov::model::{Action, SmmState};
pub use motion::interpolator::MotionInterpolator;

/// Result type alias for the gesture driver
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the gesture driver
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown command: {0}")]
    Command(char),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
