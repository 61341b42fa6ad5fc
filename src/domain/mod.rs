//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - sweep and trace containers (`Sweep`, `Trace`)
//! - segmentation records (`Region`, `Minimum`, `Window`)
//! - configuration (`SegmentConfig`, `BaselineConfig`, `FitSettings`, `RunConfig`)
//! - fit outputs (`ResonatorFit`, `FitOutcome`, `FitFile`)

pub mod types;

pub use types::*;
