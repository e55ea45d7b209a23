//! Motion
//!
//! Smooth servo motion: linear interpolation between poses over a fixed
//! duration, advanced by polling.

pub mod interpolator;

pub use interpolator::{MotionInterpolator, MotionRequest};
