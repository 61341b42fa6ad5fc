//! Off-resonance gain normalization.

use num_complex::Complex64;

use crate::error::AppError;
use crate::fit::defaults::{AMP_NORM_DEGREE, AMP_NORM_EXCLUSION_HZ};
use crate::math::polyfit;

/// Median with the two middle values averaged for even lengths.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    Some(if sorted.len() % 2 == 0 {
        0.5 * (sorted[mid - 1] + sorted[mid])
    } else {
        sorted[mid]
    })
}

/// Divide out a quadratic gain curve fitted to `|z|` away from the resonance.
///
/// Samples more than 100 kHz from the median frequency define the gain; the
/// result is rescaled by their median `|z|` so the off-resonance level is kept.
pub fn amplitude_normalization(x: &[f64], z: &[Complex64]) -> Result<Vec<Complex64>, AppError> {
    if x.len() != z.len() {
        return Err(AppError::input("Frequency and IQ arrays differ in length."));
    }
    let centre = median(x).ok_or_else(|| AppError::input("Cannot normalize an empty slice."))?;

    let (fx, fy): (Vec<f64>, Vec<f64>) = x
        .iter()
        .zip(z)
        .filter(|(f, _)| (**f - centre).abs() > AMP_NORM_EXCLUSION_HZ)
        .map(|(f, v)| (*f, v.norm()))
        .unzip();

    let gain = polyfit(&fx, &fy, AMP_NORM_DEGREE).ok_or_else(|| {
        AppError::fit(format!(
            "Amplitude normalization needs more than {AMP_NORM_DEGREE} off-resonance samples (got {}).",
            fx.len()
        ))
    })?;
    let level = median(&fy).unwrap_or(1.0);

    x.iter()
        .zip(z)
        .map(|(&f, &v)| {
            let g = gain.eval(f);
            if g == 0.0 || !g.is_finite() {
                return Err(AppError::numerical(format!("Gain curve vanishes at {f} Hz.")));
            }
            Ok(v / g * level)
        })
        .collect()
}
