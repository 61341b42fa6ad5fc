//! Input/output helpers.
//!
//! - sweep CSV ingest + validation (`ingest`)
//! - window/sweep/derivative CSV exports (`export`)
//! - fit JSON read/write and fit-settings files (`fits`)

pub mod export;
pub mod fits;
pub mod ingest;

pub use export::*;
pub use fits::*;
pub use ingest::*;
