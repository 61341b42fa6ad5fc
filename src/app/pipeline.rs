//! Shared "find / fit pipeline" logic used by the CLI subcommands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! sweep -> baseline removal -> segmentation -> IQ speed -> slicing -> fitting
//!
//! The CLI can then focus on presentation (printing, plots and exports).

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::domain::{ResonatorFits, RunConfig, Sweep};
use crate::error::AppError;
use crate::find::{Segmentation, segment};
use crate::fit::fit_slices;
use crate::io::ingest::{IngestedSweep, load_sweep};
use crate::report::{ResonanceRow, resonance_rows};
use crate::signal::{CosineLowpass, HighPass, compute_di_dq, highpass, iq_speed};
use crate::slice::{ResonatorSlice, slice_fixed_q, slice_windows};

/// All computed outputs of a `kids find` run.
#[derive(Debug, Clone)]
pub struct FindOutput {
    /// The sweep, truncated to the baseline length.
    pub sweep: Sweep,
    pub highpass: HighPass,
    pub segmentation: Segmentation,
    /// `sqrt(dI² + dQ²)` per sample with the configured filter.
    pub iq_speed: Vec<f64>,
    pub rows: Vec<ResonanceRow>,
}

/// All computed outputs of a `kids fit` run.
#[derive(Debug, Clone)]
pub struct FitOutput {
    pub find: FindOutput,
    pub slices: Vec<ResonatorSlice>,
    pub fits: BTreeMap<usize, ResonatorFits>,
}

/// Load the configured input, reporting skipped rows.
pub fn load_input(config: &RunConfig) -> Result<IngestedSweep, AppError> {
    let ingest = load_sweep(&config.input)?;
    for e in &ingest.row_errors {
        warn!(line = e.line, message = %e.message, "skipped sweep row");
    }
    info!(
        input = %config.input.display(),
        rows_read = ingest.rows_read,
        rows_used = ingest.rows_used,
        "sweep loaded"
    );
    Ok(ingest)
}

/// Baseline removal, segmentation and IQ speed for an in-memory sweep.
pub fn find_resonances(mut sweep: Sweep, config: &RunConfig) -> Result<FindOutput, AppError> {
    config.validate()?;

    let lowpass = CosineLowpass::for_sweep(sweep.sample_spacing(), config.baseline.smoothing_scale_hz)?;
    let highpass = highpass(&sweep.trace(), &lowpass)?;
    sweep.truncate(highpass.len());
    info!(samples = sweep.len(), smoothing_hz = config.baseline.smoothing_scale_hz, "baseline removed");

    let segmentation = segment(&highpass.residual, &config.segment)?;

    let i: Vec<f64> = sweep.z.iter().map(|v| v.re).collect();
    let q: Vec<f64> = sweep.z.iter().map(|v| v.im).collect();
    let (di, dq) = compute_di_dq(&i, &q, Some(&sweep.freqs_hz), config.filter, true)?;
    let iq_speed = iq_speed(&di, &dq);

    let rows = resonance_rows(&segmentation, &highpass.residual, Some(&iq_speed));

    Ok(FindOutput {
        sweep,
        highpass,
        segmentation,
        iq_speed,
        rows,
    })
}

/// `find_resonances` followed by slicing and the parallel fit batch.
pub fn fit_resonances(sweep: Sweep, config: &RunConfig) -> Result<FitOutput, AppError> {
    let find = find_resonances(sweep, config)?;

    let slices = match config.q_slice {
        Some(q) => slice_fixed_q(&find.sweep, &find.segmentation.resonator_indices(), q)?,
        None => slice_windows(&find.sweep, &find.segmentation.windows),
    };
    let masked: usize = slices.iter().map(ResonatorSlice::masked).sum();
    info!(slices = slices.len(), masked_samples = masked, "sweep sliced");

    let fits = fit_slices(&slices, &config.fit);
    Ok(FitOutput { find, slices, fits })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{SynthConfig, generate_sweep};

    #[test]
    fn synthetic_resonators_are_all_found() {
        let synth = generate_sweep(&SynthConfig::default()).unwrap();
        let out = find_resonances(synth.sweep.clone(), &RunConfig::for_input("synthetic")).unwrap();

        let found = out.segmentation.resonator_indices();
        assert_eq!(found.len(), synth.truth.len(), "found {found:?}");

        let spacing = synth.sweep.sample_spacing();
        for (k, p) in found.iter().zip(&synth.truth) {
            let offset = (out.sweep.freqs_hz[*k] - p.fr).abs();
            assert!(offset < 8.0 * spacing, "resonance at {} found {offset} Hz away", p.fr);
        }

        let windows = &out.segmentation.windows;
        assert_eq!(windows[0].left_max, 0);
        assert_eq!(windows.last().unwrap().right_max, out.sweep.len());
        assert!(windows.iter().all(|w| w.is_ordered()));
        assert_eq!(out.rows.len(), found.len());
        assert!(out.rows.iter().all(|r| r.iq_speed.is_some_and(f64::is_finite)));
    }

    #[test]
    fn fit_batch_covers_every_resonator() {
        let cfg = SynthConfig {
            points: 4001,
            resonators: 3,
            stop_hz: 3.2e8,
            ..SynthConfig::default()
        };
        let synth = generate_sweep(&cfg).unwrap();
        let out = fit_resonances(synth.sweep, &RunConfig::for_input("synthetic")).unwrap();

        let n = out.find.segmentation.windows.len();
        assert_eq!(n, 3);
        assert_eq!(out.fits.keys().copied().collect::<Vec<_>>(), (0..n).collect::<Vec<_>>());
        for (k, fits) in &out.fits {
            assert_eq!(fits.minima, out.find.segmentation.windows[*k].minima);
        }
    }

    #[test]
    fn fixed_q_slicing_is_used_when_configured() {
        let cfg = SynthConfig {
            points: 4001,
            resonators: 2,
            stop_hz: 3.2e8,
            ..SynthConfig::default()
        };
        let synth = generate_sweep(&cfg).unwrap();
        let mut run = RunConfig::for_input("synthetic");
        run.q_slice = Some(2.0e4);
        let out = fit_resonances(synth.sweep, &run).unwrap();

        // floor(3e8 / 2e4 / 5 kHz) = 3 samples per slice
        assert!(out.slices.iter().all(|s| s.len() == 3));
        for s in &out.slices {
            assert_eq!(s.freqs_hz[1], out.find.sweep.freqs_hz[s.minima]);
        }
    }
}
