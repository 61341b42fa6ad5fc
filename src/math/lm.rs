//! Box-constrained Levenberg–Marquardt.
//!
//! Minimizes `Σ r_i(p)²` for a residual function `r` subject to
//! `lower <= p <= upper`.
//!
//! - Jacobian by forward differences (backward when the forward step would
//!   leave the box).
//! - Marquardt scaling: the damping term is `λ·diag(JᵀJ)`, so parameters of
//!   very different magnitude (Hz-scale frequencies next to ns-scale delays)
//!   are damped on their own scale.
//! - Bounds are enforced by projecting every trial point onto the box.
//!
//! Convergence follows the usual MINPACK-style tests on cost reduction, step
//! size, and the scaled gradient. Running out of evaluations is an error.

use nalgebra::{DMatrix, DVector};

use crate::domain::Bounds;
use crate::error::AppError;
use crate::math::ols::solve_least_squares;

const EPS_SQRT: f64 = 1.490_116_119_384_765_6e-8;
const LAMBDA_MIN: f64 = 1e-15;
const LAMBDA_MAX: f64 = 1e16;

/// Solver tolerances and budget.
#[derive(Debug, Clone, Copy)]
pub struct LmOptions {
    /// Residual evaluations allowed at trial points (Jacobian evaluations excluded).
    pub max_evaluations: usize,
    pub ftol: f64,
    pub xtol: f64,
    pub gtol: f64,
    pub initial_lambda: f64,
}

impl LmOptions {
    pub fn for_params(n: usize) -> Self {
        Self {
            max_evaluations: 100 * n.max(1),
            ..Self::default()
        }
    }
}

impl Default for LmOptions {
    fn default() -> Self {
        Self {
            max_evaluations: 1000,
            ftol: 1e-10,
            xtol: 1e-10,
            gtol: 1e-10,
            initial_lambda: 1e-3,
        }
    }
}

/// Why the solver stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    CostConverged,
    StepConverged,
    GradientConverged,
    /// Damping grew without finding a better point; the current point is a local minimum.
    Stalled,
    ExactFit,
}

#[derive(Debug, Clone)]
pub struct LmReport {
    pub params: Vec<f64>,
    pub residuals: Vec<f64>,
    pub sse: f64,
    pub iterations: usize,
    pub evaluations: usize,
    pub termination: Termination,
    /// Jacobian at the returned parameters.
    pub jacobian: DMatrix<f64>,
}

impl LmReport {
    /// Parameter covariance `(JᵀJ)⁺ · sse / (m - n)`.
    ///
    /// `None` when there are no degrees of freedom left or the pseudo-inverse fails.
    pub fn covariance(&self) -> Option<DMatrix<f64>> {
        let (m, n) = self.jacobian.shape();
        if m <= n {
            return None;
        }
        let jtj = self.jacobian.transpose() * &self.jacobian;
        let eps = 1e-15 * jtj.amax().max(f64::MIN_POSITIVE);
        let pinv = jtj.pseudo_inverse(eps).ok()?;
        let s2 = self.sse / (m - n) as f64;
        Some(pinv * s2)
    }

    /// Square roots of the covariance diagonal.
    pub fn standard_errors(&self) -> Option<Vec<f64>> {
        let cov = self.covariance()?;
        Some((0..cov.nrows()).map(|j| cov[(j, j)].max(0.0).sqrt()).collect())
    }
}

/// Run the solver from `x0`.
pub fn minimize<F>(residual: F, x0: &[f64], bounds: &Bounds, opts: &LmOptions) -> Result<LmReport, AppError>
where
    F: Fn(&[f64]) -> Result<Vec<f64>, AppError>,
{
    let n = x0.len();
    if n == 0 {
        return Err(AppError::fit("No parameters to fit."));
    }
    if bounds.len() != n {
        return Err(AppError::fit(format!(
            "Bounds have {} entries but the guess has {n}.",
            bounds.len()
        )));
    }
    if !bounds.contains(x0) {
        return Err(AppError::fit("Initial guess lies outside the bounds."));
    }

    let mut x = DVector::from_column_slice(x0);
    let mut r = eval_residual(&residual, x.as_slice())?;
    let m = r.len();
    if m < n {
        return Err(AppError::fit(format!("{m} residuals cannot constrain {n} parameters.")));
    }
    let mut sse = r.norm_squared();
    let mut lambda = opts.initial_lambda;
    let mut evaluations = 1usize;
    let mut iterations = 0usize;

    loop {
        let jac = jacobian(&residual, &x, &r, bounds)?;
        if sse == 0.0 {
            return Ok(report(x, r, sse, iterations, evaluations, Termination::ExactFit, jac));
        }

        let grad = jac.transpose() * &r;
        if scaled_gradient_norm(&jac, &grad, sse) <= opts.gtol {
            return Ok(report(x, r, sse, iterations, evaluations, Termination::GradientConverged, jac));
        }

        let jtj = jac.transpose() * &jac;
        let diag: DVector<f64> = jtj.diagonal().map(|d| d.max(1e-300));
        iterations += 1;

        loop {
            if evaluations >= opts.max_evaluations {
                return Err(AppError::fit(format!(
                    "No convergence after {evaluations} evaluations."
                )));
            }

            let step = damped_step(&jtj, &diag, &grad, lambda)
                .ok_or_else(|| AppError::fit("Damped normal equations are singular."))?;
            let x_new = project(&(&x + &step), bounds);
            let r_new = eval_residual(&residual, x_new.as_slice())?;
            evaluations += 1;
            let sse_new = r_new.norm_squared();

            if sse_new < sse {
                let reduction = sse - sse_new;
                let small_step = x_new
                    .iter()
                    .zip(x.iter())
                    .all(|(a, b)| (a - b).abs() <= opts.xtol * (opts.xtol + b.abs()));

                x = x_new;
                r = r_new;
                sse = sse_new;
                lambda = (lambda / 10.0).max(LAMBDA_MIN);

                if reduction <= opts.ftol * (sse + reduction) {
                    let jac = jacobian(&residual, &x, &r, bounds)?;
                    return Ok(report(x, r, sse, iterations, evaluations, Termination::CostConverged, jac));
                }
                if small_step {
                    let jac = jacobian(&residual, &x, &r, bounds)?;
                    return Ok(report(x, r, sse, iterations, evaluations, Termination::StepConverged, jac));
                }
                break;
            }

            lambda *= 10.0;
            if lambda > LAMBDA_MAX {
                return Ok(report(x, r, sse, iterations, evaluations, Termination::Stalled, jac));
            }
        }
    }
}

fn report(
    x: DVector<f64>,
    r: DVector<f64>,
    sse: f64,
    iterations: usize,
    evaluations: usize,
    termination: Termination,
    jacobian: DMatrix<f64>,
) -> LmReport {
    LmReport {
        params: x.iter().copied().collect(),
        residuals: r.iter().copied().collect(),
        sse,
        iterations,
        evaluations,
        termination,
        jacobian,
    }
}

fn eval_residual<F>(residual: &F, x: &[f64]) -> Result<DVector<f64>, AppError>
where
    F: Fn(&[f64]) -> Result<Vec<f64>, AppError>,
{
    let r = residual(x)?;
    if r.iter().any(|v| !v.is_finite()) {
        return Err(AppError::numerical("Residuals contain non-finite values."));
    }
    Ok(DVector::from_vec(r))
}

fn jacobian<F>(residual: &F, x: &DVector<f64>, r: &DVector<f64>, bounds: &Bounds) -> Result<DMatrix<f64>, AppError>
where
    F: Fn(&[f64]) -> Result<Vec<f64>, AppError>,
{
    let n = x.len();
    let mut jac = DMatrix::<f64>::zeros(r.len(), n);
    let mut shifted = x.clone();

    for j in 0..n {
        let width = bounds.upper[j] - bounds.lower[j];
        let typical = if width.is_finite() && width > 0.0 { 1e-3 * width } else { 1.0 };
        let mut h = EPS_SQRT * x[j].abs().max(typical);
        if h == 0.0 {
            h = EPS_SQRT;
        }
        if x[j] + h > bounds.upper[j] {
            h = -h;
        }

        shifted[j] = x[j] + h;
        let r_shifted = eval_residual(residual, shifted.as_slice())?;
        let step = shifted[j] - x[j];
        if step == 0.0 {
            return Err(AppError::numerical(format!("Parameter {j} has no room for a finite-difference step.")));
        }
        for i in 0..r.len() {
            jac[(i, j)] = (r_shifted[i] - r[i]) / step;
        }
        shifted[j] = x[j];
    }

    if jac.iter().any(|v| !v.is_finite()) {
        return Err(AppError::numerical("Jacobian contains non-finite values."));
    }
    Ok(jac)
}

/// Largest cosine between the residual vector and a Jacobian column.
fn scaled_gradient_norm(jac: &DMatrix<f64>, grad: &DVector<f64>, sse: f64) -> f64 {
    let rnorm = sse.sqrt();
    (0..jac.ncols())
        .map(|j| {
            let cnorm = jac.column(j).norm();
            if cnorm == 0.0 {
                0.0
            } else {
                grad[j].abs() / (cnorm * rnorm)
            }
        })
        .fold(0.0, f64::max)
}

fn damped_step(jtj: &DMatrix<f64>, diag: &DVector<f64>, grad: &DVector<f64>, lambda: f64) -> Option<DVector<f64>> {
    let mut a = jtj.clone();
    for j in 0..a.nrows() {
        a[(j, j)] += lambda * diag[j];
    }
    let rhs = -grad;
    if let Some(chol) = a.clone().cholesky() {
        let step = chol.solve(&rhs);
        if step.iter().all(|v| v.is_finite()) {
            return Some(step);
        }
    }
    solve_least_squares(&a, &rhs)
}

fn project(x: &DVector<f64>, bounds: &Bounds) -> DVector<f64> {
    DVector::from_iterator(
        x.len(),
        x.iter()
            .enumerate()
            .map(|(j, v)| v.clamp(bounds.lower[j], bounds.upper[j])),
    )
}
