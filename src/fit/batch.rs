//! Parallel fitting of every resonator slice.

use std::collections::BTreeMap;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::domain::{FitOutcome, FitSettings, ModelKind, ResonatorFits};
use crate::fit::fitter::{fit_nonlinear_iq, fit_nonlinear_mag};
use crate::slice::ResonatorSlice;

/// Fit the IQ and magnitude models to every slice.
///
/// Slices are independent; each runs on its own rayon task. A failure only
/// marks that resonator's outcome as failed.
pub fn fit_slices(slices: &[ResonatorSlice], settings: &FitSettings) -> BTreeMap<usize, ResonatorFits> {
    let fits: BTreeMap<usize, ResonatorFits> = slices
        .par_iter()
        .map(|slice| (slice.resonator, fit_slice(slice, settings)))
        .collect();

    let failed = fits
        .values()
        .filter(|f| f.iq.is_failed() || f.magnitude.is_failed())
        .count();
    info!(resonators = fits.len(), with_failures = failed, "fit batch complete");
    fits
}

/// Both fits for one slice.
pub fn fit_slice(slice: &ResonatorSlice, settings: &FitSettings) -> ResonatorFits {
    let (x, z) = slice.finite();

    let iq = FitOutcome::from(fit_nonlinear_iq(&x, &z, settings));
    log_outcome(slice.resonator, ModelKind::Iq, &iq);
    let magnitude = FitOutcome::from(fit_nonlinear_mag(&x, &z, settings));
    log_outcome(slice.resonator, ModelKind::Magnitude, &magnitude);

    ResonatorFits {
        resonator: slice.resonator,
        minima: slice.minima,
        iq,
        magnitude,
    }
}

fn log_outcome(resonator: usize, model: ModelKind, outcome: &FitOutcome) {
    match outcome {
        FitOutcome::Fitted(fit) => debug!(
            resonator,
            model = model.display_name(),
            fr_hz = fit.param("fr").unwrap_or(f64::NAN),
            rmse = fit.quality.rmse,
            "resonator fitted"
        ),
        FitOutcome::Failed { reason } => warn!(
            resonator,
            model = model.display_name(),
            %reason,
            "could not fit resonator"
        ),
    }
}
