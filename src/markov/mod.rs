//! Semi-Markov Process
//!
//! State-dependent dwell sampling and action selection. The process dwells
//! ("watching") for a sampled duration, then picks the next gesture from
//! the current state's cumulative probability table.

pub mod model;
pub mod process;

pub use model::{Action, SmmState, StateParams, TransitionModel};
pub use process::{ActionFired, SemiMarkovProcess};
