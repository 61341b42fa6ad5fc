//! Reporting utilities: per-resonance rows and formatted terminal output.

pub mod format;

pub use format::*;

use serde::Serialize;

use crate::domain::Trace;
use crate::find::Segmentation;

/// One detected resonance, as shown in the find summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResonanceRow {
    pub resonator: usize,
    pub index: usize,
    pub region: usize,
    pub freq_hz: f64,
    pub depth_db: f64,
    /// `sqrt(dI² + dQ²)` at the minimum, when derivatives were computed.
    pub iq_speed: Option<f64>,
    /// Samples in `[left_max, right_max)`.
    pub span: usize,
}

/// Build one row per surviving minimum.
pub fn resonance_rows(seg: &Segmentation, trace: &Trace, speed: Option<&[f64]>) -> Vec<ResonanceRow> {
    seg.minima
        .iter()
        .zip(&seg.windows)
        .enumerate()
        .map(|(resonator, (m, w))| ResonanceRow {
            resonator,
            index: m.index,
            region: m.region,
            freq_hz: trace.freqs_hz[m.index],
            depth_db: trace.mags_db[m.index],
            iq_speed: speed.and_then(|s| s.get(m.index).copied()),
            span: w.right_max - w.left_max,
        })
        .collect()
}
