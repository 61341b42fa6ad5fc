//! Mathematical utilities: cubic roots, linear and nonlinear least squares.

pub mod cubic;
pub mod lm;
pub mod ols;

pub use cubic::*;
pub use lm::*;
pub use ols::*;
