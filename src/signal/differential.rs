//! Filtered derivatives of the I and Q quadratures.

use crate::domain::FilterKind;
use crate::error::AppError;
use crate::signal::savgol::SavitzkyGolay;

pub const SG_WINDOW: usize = 13;
pub const SG_ORDER: usize = 3;

/// Central differences in the interior, one-sided at both ends.
pub fn gradient(data: &[f64], spacing: f64) -> Result<Vec<f64>, AppError> {
    let n = data.len();
    if n < 2 {
        return Err(AppError::input("Gradient needs at least two samples."));
    }
    let mut out = Vec::with_capacity(n);
    out.push((data[1] - data[0]) / spacing);
    for i in 1..n - 1 {
        out.push((data[i + 1] - data[i - 1]) / (2.0 * spacing));
    }
    out.push((data[n - 1] - data[n - 2]) / spacing);
    Ok(out)
}

/// Derivative (or, for `Sg` without `do_deriv`, the smoothed data) of a
/// uniformly spaced series.
pub fn filtered_differential(
    data: &[f64],
    spacing: f64,
    kind: FilterKind,
    do_deriv: bool,
) -> Result<Vec<f64>, AppError> {
    match kind {
        FilterKind::Gradient => gradient(data, spacing),
        FilterKind::Sg => {
            let deriv = usize::from(do_deriv);
            SavitzkyGolay::new(SG_WINDOW, SG_ORDER)?.apply(data, deriv, spacing)
        }
        FilterKind::SgGrad => {
            let smooth = SavitzkyGolay::new(SG_WINDOW, SG_ORDER)?.apply(data, 0, 1.0)?;
            gradient(&smooth, spacing)
        }
    }
}

/// `dI` and `dQ` with the chosen filter. Without frequencies the spacing is one sample.
pub fn compute_di_dq(
    i: &[f64],
    q: &[f64],
    freqs_hz: Option<&[f64]>,
    kind: FilterKind,
    do_deriv: bool,
) -> Result<(Vec<f64>, Vec<f64>), AppError> {
    if i.len() != q.len() {
        return Err(AppError::input(format!(
            "I has {} samples but Q has {}.",
            i.len(),
            q.len()
        )));
    }
    let spacing = match freqs_hz {
        Some(f) if f.len() >= 2 => f[1] - f[0],
        Some(_) => return Err(AppError::input("Need at least two frequencies for a spacing.")),
        None => 1.0,
    };
    let di = filtered_differential(i, spacing, kind, do_deriv)?;
    let dq = filtered_differential(q, spacing, kind, do_deriv)?;
    Ok((di, dq))
}

/// `sqrt(dI² + dQ²)` per sample.
pub fn iq_speed(di: &[f64], dq: &[f64]) -> Vec<f64> {
    di.iter().zip(dq).map(|(a, b)| a.hypot(*b)).collect()
}
