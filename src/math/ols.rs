//! Linear least squares helpers.
//!
//! Several stages solve small, possibly ill-conditioned linear problems:
//!
//! - polynomial gain curves for amplitude normalization
//! - Savitzky–Golay edge polynomials
//! - damped normal equations inside the Levenberg–Marquardt loop (fallback path)
//!
//! Implementation choices:
//! - SVD handles tall (more rows than columns) and near-singular systems alike.
//! - Polynomial fits center and scale the abscissa first; raw frequencies
//!   (~1e8–1e9 Hz) squared would wreck the conditioning of the Vandermonde matrix.

use nalgebra::{DMatrix, DVector};

const SVD_MAX_ITERATIONS: usize = 1000;

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return None;
    }
    let svd = x.clone().try_svd(true, true, f64::EPSILON, SVD_MAX_ITERATIONS)?;

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// A fitted polynomial in the scaled variable `u = (x - center) / scale`.
#[derive(Debug, Clone, PartialEq)]
pub struct Polynomial {
    /// Coefficients, constant term first.
    pub coeffs: Vec<f64>,
    pub center: f64,
    pub scale: f64,
}

impl Polynomial {
    pub fn eval(&self, x: f64) -> f64 {
        let u = (x - self.center) / self.scale;
        self.coeffs.iter().rev().fold(0.0, |acc, c| acc * u + c)
    }
}

/// Least-squares polynomial of the given degree through `(x, y)`.
pub fn polyfit(x: &[f64], y: &[f64], degree: usize) -> Option<Polynomial> {
    let n = x.len();
    if n != y.len() || n <= degree {
        return None;
    }

    let (lo, hi) = x
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let center = 0.5 * (lo + hi);
    let scale = if hi > lo { 0.5 * (hi - lo) } else { 1.0 };

    let p = degree + 1;
    let mut design = DMatrix::<f64>::zeros(n, p);
    for (i, &xi) in x.iter().enumerate() {
        let u = (xi - center) / scale;
        let mut uk = 1.0;
        for k in 0..p {
            design[(i, k)] = uk;
            uk *= u;
        }
    }
    let rhs = DVector::from_column_slice(y);
    let beta = solve_least_squares(&design, &rhs)?;

    Some(Polynomial {
        coeffs: beta.iter().copied().collect(),
        center,
        scale,
    })
}
