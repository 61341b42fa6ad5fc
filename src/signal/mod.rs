//! Signal conditioning ahead of segmentation and fitting.
//!
//! - baseline removal (a low-pass of the dB trace subtracted from it)
//! - Savitzky–Golay filtering
//! - filtered I/Q derivatives

pub mod differential;
pub mod lowpass;
pub mod savgol;

pub use differential::{compute_di_dq, filtered_differential, gradient, iq_speed};
pub use lowpass::CosineLowpass;
pub use savgol::SavitzkyGolay;

use crate::domain::Trace;
use crate::error::AppError;

/// Anything that can estimate the slowly varying part of a trace.
///
/// Implementations may return fewer samples than they were given; callers
/// truncate to the returned length.
pub trait BaselineExtractor {
    fn baseline(&self, data: &[f64]) -> Result<Vec<f64>, AppError>;
}

/// Raw trace, its baseline, and their difference, all on a common length.
#[derive(Debug, Clone)]
pub struct HighPass {
    pub raw: Trace,
    pub baseline: Vec<f64>,
    pub residual: Trace,
}

impl HighPass {
    pub fn len(&self) -> usize {
        self.residual.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residual.is_empty()
    }
}

/// Subtract the extractor's baseline from `trace`.
pub fn highpass(trace: &Trace, extractor: &dyn BaselineExtractor) -> Result<HighPass, AppError> {
    let baseline = extractor.baseline(&trace.mags_db)?;
    let n = baseline.len();
    if n > trace.len() {
        return Err(AppError::numerical(format!(
            "Baseline has {n} samples for a trace of {}.",
            trace.len()
        )));
    }

    let freqs = trace.freqs_hz[..n].to_vec();
    let raw_mags = trace.mags_db[..n].to_vec();
    let residual_mags = raw_mags.iter().zip(&baseline).map(|(r, b)| r - b).collect();

    Ok(HighPass {
        raw: Trace::new(freqs.clone(), raw_mags)?,
        baseline,
        residual: Trace::new(freqs, residual_mags)?,
    })
}
