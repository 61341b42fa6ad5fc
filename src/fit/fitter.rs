//! Single-resonator fitting.
//!
//! Given one slice (`x` in Hz, complex `z`):
//! - optionally divide out the off-resonance gain
//! - take bounds and initial guess from the settings, or derive them from the data
//! - run the bounded Levenberg–Marquardt solver on the stacked residuals
//!
//! The returned fit and guess curves are produced by the same model function
//! the solver evaluated, so re-evaluating the model at the fitted parameters
//! reproduces `fit_curve` exactly.

use num_complex::Complex64;
use tracing::debug;

use crate::domain::{Bounds, FitParam, FitQuality, FitSettings, ResonatorFit};
use crate::error::AppError;
use crate::fit::defaults;
use crate::fit::normalize::amplitude_normalization;
use crate::math::{LmOptions, minimize};
use crate::models::{IqModel, MagModel, ResonatorModel};

/// Fit the nine-parameter IQ model.
pub fn fit_nonlinear_iq(x: &[f64], z: &[Complex64], settings: &FitSettings) -> Result<ResonatorFit, AppError> {
    let (x, z) = prepare(x, z, settings)?;
    let bounds = match &settings.iq_bounds {
        Some(b) => b.clone(),
        None => defaults::iq_bounds(&x)?,
    };
    let guess = match &settings.iq_guess {
        Some(g) => g.clone(),
        None => defaults::iq_guess(&x, &z)?,
    };
    fit_model::<IqModel>(x, z, &bounds, guess, settings)
}

/// Fit the eight-parameter `|S21|²` model.
pub fn fit_nonlinear_mag(x: &[f64], z: &[Complex64], settings: &FitSettings) -> Result<ResonatorFit, AppError> {
    let (x, z) = prepare(x, z, settings)?;
    let bounds = match &settings.mag_bounds {
        Some(b) => b.clone(),
        None => defaults::mag_bounds(&x)?,
    };
    let guess = match &settings.mag_guess {
        Some(g) => g.clone(),
        None => defaults::mag_guess(&x, &z)?,
    };
    fit_model::<MagModel>(x, z, &bounds, guess, settings)
}

/// Drop masked samples and apply the optional gain normalization.
fn prepare(x: &[f64], z: &[Complex64], settings: &FitSettings) -> Result<(Vec<f64>, Vec<Complex64>), AppError> {
    if x.len() != z.len() {
        return Err(AppError::input(format!(
            "Slice has {} frequencies but {} IQ samples.",
            x.len(),
            z.len()
        )));
    }
    let (x, z): (Vec<f64>, Vec<Complex64>) = x
        .iter()
        .zip(z)
        .filter(|(f, v)| f.is_finite() && v.is_finite())
        .map(|(f, v)| (*f, *v))
        .unzip();

    if settings.amp_norm {
        let z = amplitude_normalization(&x, &z)?;
        return Ok((x, z));
    }
    Ok((x, z))
}

fn fit_model<M: ResonatorModel>(
    x: Vec<f64>,
    z: Vec<Complex64>,
    bounds: &Bounds,
    guess: Vec<f64>,
    settings: &FitSettings,
) -> Result<ResonatorFit, AppError> {
    let k = M::PARAM_NAMES.len();
    if guess.len() != k || bounds.len() != k {
        return Err(AppError::config(format!(
            "The {} model takes {k} parameters (guess has {}, bounds have {}).",
            M::KIND.display_name(),
            guess.len(),
            bounds.len()
        )));
    }
    let target = M::target(&z);
    if target.len() <= k {
        return Err(AppError::fit(format!(
            "{} values cannot constrain {k} parameters.",
            target.len()
        )));
    }

    let residual = |p: &[f64]| -> Result<Vec<f64>, AppError> {
        let predicted = M::predict(&x, p)?;
        Ok(predicted.iter().zip(&target).map(|(m, d)| m - d).collect())
    };

    let mut opts = LmOptions::for_params(k);
    if let Some(budget) = settings.max_evaluations {
        opts.max_evaluations = budget;
    }
    let report = minimize(residual, &guess, bounds, &opts)?;
    debug!(
        model = M::KIND.display_name(),
        sse = report.sse,
        iterations = report.iterations,
        evaluations = report.evaluations,
        termination = ?report.termination,
        "fit converged"
    );

    let stderrs = if settings.estimate_errors {
        report.standard_errors()
    } else {
        None
    };

    let params = M::PARAM_NAMES
        .iter()
        .enumerate()
        .map(|(j, name)| FitParam {
            name: (*name).to_string(),
            value: report.params[j],
            initial: guess[j],
            stderr: stderrs.as_ref().map(|s| s[j]),
        })
        .collect();

    let m = target.len();
    let quality = FitQuality {
        sse: report.sse,
        rmse: (report.sse / m as f64).sqrt(),
        reduced_chi2: report.sse / (m - k) as f64,
        n: m,
        iterations: report.iterations,
    };

    Ok(ResonatorFit {
        model: M::KIND,
        params,
        quality,
        fit_curve: M::curve(&x, &report.params)?,
        guess_curve: M::curve(&x, &guess)?,
        freqs_hz: x,
        data: z,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Curve, ModelKind};
    use crate::models::{IqParams, MagParams, nonlinear_iq, nonlinear_mag};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand_distr::{Distribution, Normal};

    const FR: f64 = 3.0e8;

    fn truth() -> IqParams {
        IqParams {
            fr: FR,
            qr: 2.0e4,
            amp: 0.6,
            phi: 0.2,
            a: 0.2,
            i0: 1.0,
            q0: 0.5,
            tau: 5.0e-8,
            f0: FR,
        }
    }

    fn axis() -> Vec<f64> {
        (0..401).map(|i| FR + (i as f64 - 200.0) * 1.0e3).collect()
    }

    fn generous() -> FitSettings {
        FitSettings {
            max_evaluations: Some(10_000),
            ..FitSettings::default()
        }
    }

    fn noisy_sweep(seed: u64) -> (Vec<f64>, Vec<Complex64>) {
        let x = axis();
        let mut rng = StdRng::seed_from_u64(seed);
        let noise = Normal::new(0.0, 1.0e-3).unwrap();
        let z = nonlinear_iq(&x, &truth())
            .unwrap()
            .into_iter()
            .map(|v| v + Complex64::new(noise.sample(&mut rng), noise.sample(&mut rng)))
            .collect();
        (x, z)
    }

    #[test]
    fn recovers_resonator_parameters_from_noisy_iq() {
        let (x, z) = noisy_sweep(11);
        let settings = FitSettings {
            iq_guess: Some(vec![FR + 3.0e3, 1.5e4, 0.5, 0.1, 0.1, 0.95, 0.45, 6.0e-8, FR + 3.0e3]),
            max_evaluations: Some(5_000),
            ..FitSettings::default()
        };

        let fit = fit_nonlinear_iq(&x, &z, &settings).unwrap();
        assert_eq!(fit.model, ModelKind::Iq);
        let p = IqParams::from_slice(&fit.values()).unwrap();
        let t = truth();
        assert!((p.fr - t.fr).abs() < 1.0e3, "fr={}", p.fr);
        assert!((p.qr - t.qr).abs() < 0.02 * t.qr, "Qr={}", p.qr);
        assert!((p.amp - t.amp).abs() < 0.02, "amp={}", p.amp);
        assert!((p.phi - t.phi).abs() < 0.05, "phi={}", p.phi);
        assert!((p.a - t.a).abs() < 0.05, "a={}", p.a);
        assert!((p.tau - t.tau).abs() < 2.0e-9, "tau={}", p.tau);
        // f0 trades off against the phase of i0 + jq0; only the gain modulus is pinned down.
        let gain = Complex64::new(p.i0, p.q0).norm();
        let true_gain = Complex64::new(t.i0, t.q0).norm();
        assert!((gain - true_gain).abs() < 0.01 * true_gain, "|gain|={gain}");
        assert!(fit.quality.rmse < 5.0e-3, "rmse={}", fit.quality.rmse);
    }

    #[test]
    fn pinned_zero_parameter_terminates() {
        let x = axis();
        let linear = IqParams { a: 0.0, ..truth() };
        let z = nonlinear_iq(&x, &linear).unwrap();

        let mut bounds = defaults::iq_bounds(&x).unwrap();
        bounds.lower[4] = 0.0;
        bounds.upper[4] = 0.0;
        let settings = FitSettings {
            iq_bounds: Some(bounds),
            iq_guess: Some(IqParams { fr: FR + 2.0e3, qr: 1.8e4, ..linear }.to_vec()),
            max_evaluations: Some(2_000),
            ..FitSettings::default()
        };

        match fit_nonlinear_iq(&x, &z, &settings) {
            Ok(fit) => {
                assert_eq!(fit.param("a"), Some(0.0));
                assert!((fit.param("fr").unwrap() - FR).abs() < 1.0e3);
            }
            Err(e) => assert!(matches!(e, AppError::Fit(_) | AppError::Numerical(_)), "{e}"),
        }
    }

    #[test]
    fn fit_curve_is_the_model_at_the_fitted_parameters() {
        let (x, z) = noisy_sweep(5);
        let fit = fit_nonlinear_iq(&x, &z, &generous()).unwrap();
        let again = nonlinear_iq(&fit.freqs_hz, &IqParams::from_slice(&fit.values()).unwrap()).unwrap();
        assert_eq!(fit.fit_curve, Curve::Complex(again));

        let guess: Vec<f64> = fit.params.iter().map(|p| p.initial).collect();
        let guess_curve = nonlinear_iq(&fit.freqs_hz, &IqParams::from_slice(&guess).unwrap()).unwrap();
        assert_eq!(fit.guess_curve, Curve::Complex(guess_curve));
    }

    #[test]
    fn magnitude_fit_improves_on_its_guess() {
        let (x, z) = noisy_sweep(3);
        let fit = fit_nonlinear_mag(&x, &z, &generous()).unwrap();
        assert_eq!(fit.params.len(), 8);

        let guess: Vec<f64> = fit.params.iter().map(|p| p.initial).collect();
        let guess_curve = nonlinear_mag(&x, &MagParams::from_slice(&guess).unwrap()).unwrap();
        let guess_sse: f64 = guess_curve
            .iter()
            .zip(&z)
            .map(|(m, d)| (m - d.norm_sqr()).powi(2))
            .sum();
        assert!(fit.quality.sse <= guess_sse);

        let again = nonlinear_mag(&x, &MagParams::from_slice(&fit.values()).unwrap()).unwrap();
        assert_eq!(fit.fit_curve, Curve::Real(again));
    }

    #[test]
    fn error_estimates_are_reported_on_request() {
        let (x, z) = noisy_sweep(9);
        let settings = FitSettings {
            estimate_errors: true,
            ..generous()
        };
        let fit = fit_nonlinear_iq(&x, &z, &settings).unwrap();
        assert!(fit.params.iter().all(|p| p.stderr.is_some_and(|s| s.is_finite() && s >= 0.0)));
    }

    #[test]
    fn masked_samples_are_ignored() {
        let (x, mut z) = noisy_sweep(1);
        z[0] = Complex64::new(f64::NAN, f64::NAN);
        let fit = fit_nonlinear_mag(&x, &z, &generous()).unwrap();
        assert_eq!(fit.freqs_hz.len(), 400);
    }

    #[test]
    fn infeasible_guess_fails_the_fit() {
        let (x, z) = noisy_sweep(2);
        let settings = FitSettings {
            iq_guess: Some(vec![FR, 1.0e9, 0.5, 0.0, 0.0, 1.0, 0.5, 1.0e-7, FR]),
            ..FitSettings::default()
        };
        assert!(matches!(fit_nonlinear_iq(&x, &z, &settings), Err(AppError::Fit(_))));
    }

    #[test]
    fn wrong_guess_length_is_a_config_error() {
        let (x, z) = noisy_sweep(2);
        let settings = FitSettings {
            mag_guess: Some(vec![FR]),
            ..FitSettings::default()
        };
        assert!(matches!(fit_nonlinear_mag(&x, &z, &settings), Err(AppError::Config(_))));
    }
}
