//! Data-derived default bounds and initial guesses.
//!
//! Frequency-like parameters (`fr`, `f0`, `flin`) are bounded by the slice's
//! own frequency span; everything else uses the named constants below.

use num_complex::Complex64;

use crate::domain::Bounds;
use crate::error::AppError;

pub const QR_MIN: f64 = 2.0e3;
pub const QR_MAX: f64 = 2.0e5;
pub const QR_GUESS: f64 = 1.0e4;

pub const AMP_MIN: f64 = 0.01;
pub const AMP_MAX: f64 = 100.0;
pub const AMP_GUESS: f64 = 0.5;

/// Phase rotation is bounded to `±PHI_LIMIT`.
pub const PHI_LIMIT: f64 = 4.0 * std::f64::consts::PI;
pub const PHI_GUESS: f64 = 0.0;

pub const A_MIN: f64 = 0.0;
pub const A_MAX: f64 = 5.0;
pub const A_GUESS: f64 = 0.0;

/// Bound on the IQ offsets `i0`, `q0` and the magnitude gain terms `b0`, `b1`.
pub const OFFSET_LIMIT: f64 = 5.0;

pub const TAU_MIN: f64 = 1.0e-9;
pub const TAU_MAX: f64 = 1.0e-6;
pub const TAU_GUESS: f64 = 3.0e-7;

/// Samples closer than this to the slice's median frequency are treated as
/// on-resonance by the amplitude normalization.
pub const AMP_NORM_EXCLUSION_HZ: f64 = 1.0e5;
pub const AMP_NORM_DEGREE: usize = 2;

fn span(x: &[f64]) -> Result<(f64, f64), AppError> {
    if x.len() < 2 {
        return Err(AppError::input("Need at least two samples to derive fit bounds."));
    }
    Ok(x.iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v))))
}

/// Frequency of the deepest `|z|` sample.
pub fn fr_guess(x: &[f64], z: &[Complex64]) -> Result<f64, AppError> {
    z.iter()
        .zip(x)
        .min_by(|a, b| a.0.norm().total_cmp(&b.0.norm()))
        .map(|(_, &f)| f)
        .ok_or_else(|| AppError::input("Cannot guess a resonance frequency from no data."))
}

/// `[fr, Qr, amp, phi, a, i0, q0, tau, f0]`
pub fn iq_bounds(x: &[f64]) -> Result<Bounds, AppError> {
    let (lo, hi) = span(x)?;
    Bounds::new(
        vec![lo, QR_MIN, AMP_MIN, -PHI_LIMIT, A_MIN, -OFFSET_LIMIT, -OFFSET_LIMIT, TAU_MIN, lo],
        vec![hi, QR_MAX, AMP_MAX, PHI_LIMIT, A_MAX, OFFSET_LIMIT, OFFSET_LIMIT, TAU_MAX, hi],
    )
}

pub fn iq_guess(x: &[f64], z: &[Complex64]) -> Result<Vec<f64>, AppError> {
    let fr = fr_guess(x, z)?;
    let n = z.len() as f64;
    let mean = z.iter().sum::<Complex64>() / n;
    Ok(vec![fr, QR_GUESS, AMP_GUESS, PHI_GUESS, A_GUESS, mean.re, mean.im, TAU_GUESS, fr])
}

/// `[fr, Qr, amp, phi, a, b0, b1, flin]`
pub fn mag_bounds(x: &[f64]) -> Result<Bounds, AppError> {
    let (lo, hi) = span(x)?;
    Bounds::new(
        vec![lo, QR_MIN, AMP_MIN, -PHI_LIMIT, A_MIN, -OFFSET_LIMIT, -OFFSET_LIMIT, lo],
        vec![hi, QR_MAX, AMP_MAX, PHI_LIMIT, A_MAX, OFFSET_LIMIT, OFFSET_LIMIT, hi],
    )
}

pub fn mag_guess(x: &[f64], z: &[Complex64]) -> Result<Vec<f64>, AppError> {
    let fr = fr_guess(x, z)?;
    let level = z[0].norm_sqr();
    Ok(vec![fr, QR_GUESS, AMP_GUESS, PHI_GUESS, A_GUESS, level, level, fr])
}
