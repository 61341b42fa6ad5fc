//! Data sources other than files on disk.

pub mod sample;

pub use sample::{SynthConfig, SynthSweep, generate_sweep};
