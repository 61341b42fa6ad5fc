//! Nonlinear resonator model implementations.
//!
//! Models are implemented as small, pure functions so that fitting code can
//! stay generic over [`ResonatorModel`].

pub mod model;

pub use model::*;
