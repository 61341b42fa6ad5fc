//! Per-resonator slicing of a sweep, and retuning of resonator indices.
//!
//! Two slicing strategies:
//!
//! - window slicing: the samples `[left_fitter_pad, right_fitter_pad]` of a
//!   segmentation window, with neighbour-side masking
//! - fixed-Q slicing: a symmetric span whose width follows a target quality factor
//!
//! Masked samples are `NaN + jNaN`; consumers drop them before fitting.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::domain::{Sweep, Window};
use crate::error::AppError;
use crate::find::midpoint;

const MASKED: Complex64 = Complex64::new(f64::NAN, f64::NAN);

/// The samples handed to the fitter for one resonator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResonatorSlice {
    pub resonator: usize,
    /// Sample index of the resonance in the full sweep.
    pub minima: usize,
    pub freqs_hz: Vec<f64>,
    pub z: Vec<Complex64>,
}

impl ResonatorSlice {
    pub fn len(&self) -> usize {
        self.freqs_hz.len()
    }

    pub fn is_empty(&self) -> bool {
        self.freqs_hz.is_empty()
    }

    pub fn masked(&self) -> usize {
        self.z.iter().filter(|v| v.is_nan()).count()
    }

    /// Frequencies and samples with the masked entries removed.
    pub fn finite(&self) -> (Vec<f64>, Vec<Complex64>) {
        self.freqs_hz
            .iter()
            .zip(self.z.iter())
            .filter(|(f, v)| f.is_finite() && v.is_finite())
            .map(|(f, v)| (*f, *v))
            .unzip()
    }
}

/// Slice every window out of the sweep.
///
/// On a side where the fitter pad ran into the neighbouring resonator's
/// boundary, samples beyond the guard pad are masked so the neighbour's dip
/// does not leak into the fit.
pub fn slice_windows(sweep: &Sweep, windows: &[Window]) -> Vec<ResonatorSlice> {
    let last_sample = sweep.len().saturating_sub(1);
    let last_window = windows.len().saturating_sub(1);

    windows
        .iter()
        .enumerate()
        .map(|(k, w)| {
            let start = w.left_fitter_pad.min(last_sample);
            let end = w.right_fitter_pad.min(last_sample);
            let mask_left = k > 0 && w.left_fitter_pad == w.left_max;
            let mask_right = k < last_window && w.right_fitter_pad == w.right_max;

            let z = (start..=end)
                .map(|j| {
                    if (mask_left && j < w.left_pad) || (mask_right && j > w.right_pad) {
                        MASKED
                    } else {
                        sweep.z[j]
                    }
                })
                .collect();

            ResonatorSlice {
                resonator: k,
                minima: w.minima,
                freqs_hz: sweep.freqs_hz[start..=end].to_vec(),
                z,
            }
        })
        .collect()
}

/// Samples in a fixed-Q slice: `floor(f[0] / q_slice / Δf)`.
pub fn fixed_q_span(sweep: &Sweep, q_slice: f64) -> Result<usize, AppError> {
    if !(q_slice.is_finite() && q_slice > 0.0) {
        return Err(AppError::config(format!("Slice quality factor must be > 0 (got {q_slice}).")));
    }
    let n = (sweep.freqs_hz[0] / q_slice / sweep.sample_spacing()).floor() as usize;
    if n == 0 {
        return Err(AppError::config(format!(
            "Slice quality factor {q_slice} leaves less than one sample per slice."
        )));
    }
    Ok(n)
}

/// `n`-sample slices centred on each index, `n` from [`fixed_q_span`].
///
/// Slices start `n / 2` samples below the index, so an even `n` carries the
/// extra sample on the low side. Samples outside the sweep, or past the
/// midpoint to the neighbouring resonator, are masked. Frequencies outside
/// the sweep are extrapolated on the sweep's spacing. `indices` must be ascending.
pub fn slice_fixed_q(sweep: &Sweep, indices: &[usize], q_slice: f64) -> Result<Vec<ResonatorSlice>, AppError> {
    let n = fixed_q_span(sweep, q_slice)? as i64;
    let len = sweep.len() as i64;
    let df = sweep.sample_spacing();

    if let Some(&bad) = indices.iter().find(|&&k| k >= sweep.len()) {
        return Err(AppError::input(format!(
            "Resonator index {bad} is outside a sweep of {} samples.",
            sweep.len()
        )));
    }

    let slices = indices
        .iter()
        .enumerate()
        .map(|(r, &k)| {
            let lo_limit = r.checked_sub(1).map_or(i64::MIN, |p| midpoint(indices[p], k) as i64);
            let hi_limit = indices.get(r + 1).map_or(i64::MAX, |&next| midpoint(k, next) as i64);
            let center = k as i64;

            let start = center - n / 2;
            let (freqs_hz, z) = (start..start + n)
                .map(|j| {
                    let f = sweep.freqs_hz[k] + (j - center) as f64 * df;
                    if j < 0 || j >= len {
                        (f, MASKED)
                    } else if j < lo_limit || j > hi_limit {
                        (sweep.freqs_hz[j as usize], MASKED)
                    } else {
                        (sweep.freqs_hz[j as usize], sweep.z[j as usize])
                    }
                })
                .unzip();

            ResonatorSlice {
                resonator: r,
                minima: k,
                freqs_hz,
                z,
            }
        })
        .collect();

    Ok(slices)
}

/// Search span (samples) below and above an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lookaround {
    pub low: usize,
    pub high: usize,
}

impl Lookaround {
    pub fn symmetric(n: usize) -> Self {
        Self { low: n, high: n }
    }
}

/// Move every index to the deepest sample within `[k - low, k + high]`.
///
/// Both ends are included. Ties keep the lowest index. Spans are clipped to the trace.
pub fn retune(mags_db: &[f64], indices: &[usize], span: Lookaround) -> Result<Vec<usize>, AppError> {
    if mags_db.is_empty() {
        return Err(AppError::input("Cannot retune on an empty trace."));
    }
    let last = mags_db.len() - 1;

    indices
        .iter()
        .map(|&k| {
            if k > last {
                return Err(AppError::input(format!(
                    "Resonator index {k} is outside a trace of {} samples.",
                    mags_db.len()
                )));
            }
            let lo = k.saturating_sub(span.low);
            let hi = k.saturating_add(span.high).min(last);
            let best = (lo..=hi).fold(lo, |best, j| if mags_db[j] < mags_db[best] { j } else { best });
            Ok(best)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sweep(n: usize) -> Sweep {
        let freqs = (0..n).map(|i| 1.0e8 + i as f64 * 1.0e3).collect();
        let z = (0..n).map(|i| Complex64::new(1.0 + i as f64, 0.0)).collect();
        Sweep::new(freqs, z).unwrap()
    }

    fn window(left: [usize; 4], minima: usize, right: [usize; 4]) -> Window {
        Window {
            left_max: left[0],
            left_fitter_pad: left[1],
            left_pad: left[2],
            left_window: left[3],
            minima,
            right_window: right[0],
            right_pad: right[1],
            right_fitter_pad: right[2],
            right_max: right[3],
        }
    }

    #[test]
    fn window_slice_is_inclusive_and_clamped() {
        let s = sweep(20);
        let w = window([0, 2, 4, 5], 8, [11, 12, 14, 20]);
        let out = slice_windows(&s, &[w]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].len(), 13);
        assert_eq!(out[0].freqs_hz[0], s.freqs_hz[2]);
        assert_eq!(out[0].masked(), 0);

        let w = window([0, 0, 4, 5], 8, [11, 12, 20, 20]);
        let out = slice_windows(&s, &[w]);
        assert_eq!(out[0].len(), 20);
    }

    #[test]
    fn colliding_side_is_masked_past_guard_pad() {
        let s = sweep(40);
        let a = window([0, 0, 2, 4], 6, [8, 9, 10, 10]);
        let b = window([10, 10, 12, 14], 16, [18, 20, 25, 40]);
        let out = slice_windows(&s, &[a, b]);

        // a: right side collided (fitter pad == right_max) -> 10 masked.
        assert_eq!(out[0].masked(), 1);
        assert!(out[0].z[10].is_nan());
        // a: left side is the trace edge, never masked.
        assert!(!out[0].z[0].is_nan());
        // b: left side collided -> 10, 11 masked.
        assert_eq!(out[1].masked(), 2);
        let (f, z) = out[1].finite();
        assert_eq!(f.len(), z.len());
        assert_eq!(f[0], s.freqs_hz[12]);
    }

    #[test]
    fn fixed_q_slices_mask_edges_and_neighbours() {
        // f0 = 1e8, df = 1e3, q = 2e4 -> n = 5
        let s = sweep(30);
        assert_eq!(fixed_q_span(&s, 2.0e4).unwrap(), 5);

        let out = slice_fixed_q(&s, &[1, 4, 20], 2.0e4).unwrap();
        assert!(out.iter().all(|sl| sl.len() == 5));
        // -1 is outside the sweep; 3 is past midpoint(1, 4) = 2.
        assert_eq!(out[0].freqs_hz[0], s.freqs_hz[1] - 2.0e3);
        assert_eq!(out[0].freqs_hz[2], s.freqs_hz[1]);
        assert_eq!(out[0].masked(), 2);
        assert!(out[0].z[0].is_nan() && out[0].z[4].is_nan());
        // the shared midpoint sample 2 stays in both neighbours.
        assert_eq!(out[1].masked(), 0);
        assert_eq!(out[1].freqs_hz[0], s.freqs_hz[2]);
        assert_eq!(out[2].masked(), 0);
        assert_eq!(out[2].freqs_hz, s.freqs_hz[18..23].to_vec());
    }

    #[test]
    fn even_fixed_q_span_leans_low() {
        // n = floor(1e8 / 2.5e4 / 1e3) = 4 -> indices k-2..=k+1
        let s = sweep(30);
        let out = slice_fixed_q(&s, &[10], 2.5e4).unwrap();
        assert_eq!(out[0].freqs_hz, s.freqs_hz[8..12].to_vec());
    }

    #[test]
    fn fixed_q_rejects_bad_inputs() {
        let s = sweep(10);
        assert!(matches!(slice_fixed_q(&s, &[1], 0.0), Err(AppError::Config(_))));
        assert!(matches!(slice_fixed_q(&s, &[10], 1.0e4), Err(AppError::Input(_))));
        // n = floor(1e8 / 1e6 / 1e3) = 0
        assert!(matches!(slice_fixed_q(&s, &[1], 1.0e6), Err(AppError::Config(_))));
    }

    #[test]
    fn retune_moves_to_deepest_sample() {
        let mags = [0.0, -1.0, -3.0, -2.0, -1.0, -5.0, -1.0];
        assert_eq!(retune(&mags, &[3], Lookaround::symmetric(1)).unwrap(), vec![2]);
        assert_eq!(retune(&mags, &[3], Lookaround { low: 0, high: 2 }).unwrap(), vec![5]);
        assert_eq!(retune(&mags, &[0, 6], Lookaround::symmetric(10)).unwrap(), vec![5, 5]);
        assert!(retune(&mags, &[7], Lookaround::symmetric(1)).is_err());
    }

    #[test]
    fn retune_span_includes_both_edges() {
        let mags = [0.0, -4.0, -1.0, -1.0, -1.0, -4.5, 0.0];
        assert_eq!(retune(&mags, &[3], Lookaround::symmetric(2)).unwrap(), vec![5]);
        assert_eq!(retune(&mags, &[3], Lookaround { low: 2, high: 1 }).unwrap(), vec![1]);
    }
}
