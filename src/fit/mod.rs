//! Resonator fitting.
//!
//! Responsibilities:
//!
//! - default bounds and guesses derived from each slice
//! - optional off-resonance gain normalization
//! - bounded nonlinear least squares per resonator
//! - the parallel batch over all resonators

pub mod batch;
pub mod defaults;
pub mod fitter;
pub mod normalize;

pub use batch::*;
pub use fitter::*;
pub use normalize::amplitude_normalization;
