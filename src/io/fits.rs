//! Read/write fit JSON files and fit-settings files.
//!
//! A fit file is the portable record of one `kids fit` run:
//! - the segmentation settings and windows
//! - per resonator: the IQ and magnitude outcomes (parameters, quality,
//!   data, fit and guess curves)
//!
//! The schema is defined by `domain::FitFile`.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use chrono::Utc;

use crate::domain::{FitFile, FitSettings, ResonatorFits, SegmentConfig, Window};
use crate::error::AppError;

pub const TOOL_NAME: &str = "kids";

/// Assemble a fit file stamped with the current UTC time.
pub fn build_fit_file(
    segment: &SegmentConfig,
    windows: &[Window],
    fits: &BTreeMap<usize, ResonatorFits>,
) -> FitFile {
    FitFile {
        tool: TOOL_NAME.to_string(),
        generated: Utc::now().to_rfc3339(),
        segment: *segment,
        windows: windows.to_vec(),
        fits: fits.values().cloned().collect(),
    }
}

/// Write a fit JSON file.
pub fn write_fits_json(path: &Path, fit_file: &FitFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create fit JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, fit_file)
        .map_err(|e| AppError::io(format!("Failed to write fit JSON: {e}")))?;
    Ok(())
}

/// Read a fit JSON file.
pub fn read_fits_json(path: &Path) -> Result<FitFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::io(format!("Failed to open fit JSON '{}': {e}", path.display())))?;
    serde_json::from_reader(file).map_err(|e| AppError::input(format!("Invalid fit JSON: {e}")))
}

/// Read fit bounds/guesses overrides.
pub fn read_fit_settings(path: &Path) -> Result<FitSettings, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::io(format!("Failed to open fit settings '{}': {e}", path.display())))?;
    let settings: FitSettings = serde_json::from_reader(file)
        .map_err(|e| AppError::config(format!("Invalid fit settings JSON: {e}")))?;
    settings.validate()?;
    Ok(settings)
}
