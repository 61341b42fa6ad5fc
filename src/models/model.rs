//! Nonlinear kinetic-inductance resonator models.
//!
//! Both models share the resonance factor
//!
//! ```text
//! s(y) = 1 - amp·e^{jφ} / (1 + 2jy) + amp/2 · (e^{jφ} - 1)
//! ```
//!
//! where the detuning `y` solves `yg = y - a / (1 + 4y²)`, i.e. the cubic
//! `4y³ - 4·yg·y² + y - (yg + a) = 0` with `yg = Qr·(x - fr)/fr`. Above the
//! bifurcation (`a ≈ 0.77`) the cubic has three real roots for some
//! frequencies; the largest one is used.
//!
//! - magnitude model: `(b0 + b1·(x - flin)/flin) · |s|²`
//! - IQ model: `(i0 + j·q0) · e^{-j2π(x - f0)τ} · s`

use std::f64::consts::PI;

use num_complex::Complex64;

use crate::domain::{Curve, ModelKind};
use crate::error::AppError;
use crate::math::largest_real_root;

pub const IQ_PARAM_NAMES: [&str; 9] = ["fr", "Qr", "amp", "phi", "a", "i0", "q0", "tau", "f0"];
pub const MAG_PARAM_NAMES: [&str; 8] = ["fr", "Qr", "amp", "phi", "a", "b0", "b1", "flin"];

/// Parameters of the IQ model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IqParams {
    /// Resonance frequency (Hz).
    pub fr: f64,
    /// Loaded quality factor.
    pub qr: f64,
    /// `Qr / Qc`.
    pub amp: f64,
    /// Impedance-mismatch rotation.
    pub phi: f64,
    /// Nonlinearity.
    pub a: f64,
    pub i0: f64,
    pub q0: f64,
    /// Cable delay (s).
    pub tau: f64,
    /// Reference frequency of the delay phase.
    pub f0: f64,
}

impl IqParams {
    pub fn to_vec(&self) -> Vec<f64> {
        vec![
            self.fr, self.qr, self.amp, self.phi, self.a, self.i0, self.q0, self.tau, self.f0,
        ]
    }

    pub fn from_slice(p: &[f64]) -> Result<Self, AppError> {
        check_len(p, IQ_PARAM_NAMES.len(), "IQ")?;
        Ok(Self {
            fr: p[0],
            qr: p[1],
            amp: p[2],
            phi: p[3],
            a: p[4],
            i0: p[5],
            q0: p[6],
            tau: p[7],
            f0: p[8],
        })
    }
}

/// Parameters of the magnitude model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MagParams {
    pub fr: f64,
    pub qr: f64,
    pub amp: f64,
    pub phi: f64,
    pub a: f64,
    /// Off-resonance level of `|S21|²`.
    pub b0: f64,
    /// Linear gain slope.
    pub b1: f64,
    /// Reference frequency of the gain slope.
    pub flin: f64,
}

impl MagParams {
    pub fn to_vec(&self) -> Vec<f64> {
        vec![
            self.fr, self.qr, self.amp, self.phi, self.a, self.b0, self.b1, self.flin,
        ]
    }

    pub fn from_slice(p: &[f64]) -> Result<Self, AppError> {
        check_len(p, MAG_PARAM_NAMES.len(), "magnitude")?;
        Ok(Self {
            fr: p[0],
            qr: p[1],
            amp: p[2],
            phi: p[3],
            a: p[4],
            b0: p[5],
            b1: p[6],
            flin: p[7],
        })
    }
}

fn check_len(p: &[f64], expected: usize, model: &str) -> Result<(), AppError> {
    if p.len() != expected {
        return Err(AppError::config(format!(
            "The {model} model takes {expected} parameters, got {}.",
            p.len()
        )));
    }
    Ok(())
}

/// Nonlinear detuning `y` at frequency `x`.
///
/// Fails when the cubic has no real root, which only happens for non-finite inputs.
pub fn detuning(x: f64, fr: f64, qr: f64, a: f64) -> Result<f64, AppError> {
    let yg = qr * (x - fr) / fr;
    largest_real_root(4.0, -4.0 * yg, 1.0, -(yg + a)).ok_or_else(|| {
        AppError::numerical(format!(
            "No real detuning root at x={x} (fr={fr}, Qr={qr}, a={a})."
        ))
    })
}

fn resonance_factor(y: f64, amp: f64, phi: f64) -> Complex64 {
    let rot = Complex64::from_polar(1.0, phi);
    let one = Complex64::new(1.0, 0.0);
    one - amp * rot / Complex64::new(1.0, 2.0 * y) + amp / 2.0 * (rot - one)
}

/// Complex S21 of the IQ model at every frequency.
pub fn nonlinear_iq(x: &[f64], params: &IqParams) -> Result<Vec<Complex64>, AppError> {
    let gain = Complex64::new(params.i0, params.q0);
    x.iter()
        .map(|&xi| {
            let y = detuning(xi, params.fr, params.qr, params.a)?;
            let delay = Complex64::from_polar(1.0, -2.0 * PI * (xi - params.f0) * params.tau);
            Ok(gain * delay * resonance_factor(y, params.amp, params.phi))
        })
        .collect()
}

/// `|S21|²` of the magnitude model at every frequency.
pub fn nonlinear_mag(x: &[f64], params: &MagParams) -> Result<Vec<f64>, AppError> {
    x.iter()
        .map(|&xi| {
            let y = detuning(xi, params.fr, params.qr, params.a)?;
            let xlin = (xi - params.flin) / params.flin;
            Ok((params.b0 + params.b1 * xlin) * resonance_factor(y, params.amp, params.phi).norm_sqr())
        })
        .collect()
}

/// A resonator model as seen by the fitter: a real-valued prediction vector
/// that is compared element-wise against a real-valued target.
pub trait ResonatorModel {
    const KIND: ModelKind;
    const PARAM_NAMES: &'static [&'static str];

    /// Real-valued prediction (IQ: all real parts, then all imaginary parts).
    fn predict(x: &[f64], p: &[f64]) -> Result<Vec<f64>, AppError>;

    /// The data in the same layout as `predict`.
    fn target(z: &[Complex64]) -> Vec<f64>;

    /// Model curve in its natural form (complex IQ or real `|S21|²`).
    fn curve(x: &[f64], p: &[f64]) -> Result<Curve, AppError>;
}

pub struct IqModel;

impl ResonatorModel for IqModel {
    const KIND: ModelKind = ModelKind::Iq;
    const PARAM_NAMES: &'static [&'static str] = &IQ_PARAM_NAMES;

    fn predict(x: &[f64], p: &[f64]) -> Result<Vec<f64>, AppError> {
        let z = nonlinear_iq(x, &IqParams::from_slice(p)?)?;
        Ok(stack(&z))
    }

    fn target(z: &[Complex64]) -> Vec<f64> {
        stack(z)
    }

    fn curve(x: &[f64], p: &[f64]) -> Result<Curve, AppError> {
        Ok(Curve::Complex(nonlinear_iq(x, &IqParams::from_slice(p)?)?))
    }
}

pub struct MagModel;

impl ResonatorModel for MagModel {
    const KIND: ModelKind = ModelKind::Magnitude;
    const PARAM_NAMES: &'static [&'static str] = &MAG_PARAM_NAMES;

    fn predict(x: &[f64], p: &[f64]) -> Result<Vec<f64>, AppError> {
        nonlinear_mag(x, &MagParams::from_slice(p)?)
    }

    fn target(z: &[Complex64]) -> Vec<f64> {
        z.iter().map(|v| v.norm_sqr()).collect()
    }

    fn curve(x: &[f64], p: &[f64]) -> Result<Curve, AppError> {
        Ok(Curve::Real(nonlinear_mag(x, &MagParams::from_slice(p)?)?))
    }
}

/// Real parts followed by imaginary parts.
fn stack(z: &[Complex64]) -> Vec<f64> {
    z.iter().map(|v| v.re).chain(z.iter().map(|v| v.im)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_params() -> IqParams {
        IqParams {
            fr: 3.0e8,
            qr: 2.0e4,
            amp: 0.6,
            phi: 0.0,
            a: 0.0,
            i0: 1.0,
            q0: 0.0,
            tau: 0.0,
            f0: 3.0e8,
        }
    }

    #[test]
    fn linear_dip_depth_matches_coupling() {
        // On resonance with phi = 0 and a = 0: s = 1 - amp.
        let p = linear_params();
        let z = nonlinear_iq(&[p.fr], &p).unwrap();
        assert!((z[0].re - 0.4).abs() < 1e-12);
        assert!(z[0].im.abs() < 1e-12);
    }

    #[test]
    fn far_off_resonance_approaches_unity() {
        let p = linear_params();
        let z = nonlinear_iq(&[p.fr * 1.01], &p).unwrap();
        assert!((z[0].norm() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn magnitude_model_is_squared_iq_magnitude() {
        let iq = IqParams {
            a: 0.4,
            phi: 0.3,
            ..linear_params()
        };
        let mag = MagParams {
            fr: iq.fr,
            qr: iq.qr,
            amp: iq.amp,
            phi: iq.phi,
            a: iq.a,
            b0: 1.0,
            b1: 0.0,
            flin: iq.fr,
        };
        let x: Vec<f64> = (0..21).map(|i| iq.fr + (i as f64 - 10.0) * 2.0e3).collect();
        let z = nonlinear_iq(&x, &iq).unwrap();
        let m = nonlinear_mag(&x, &mag).unwrap();
        for (zi, mi) in z.iter().zip(m.iter()) {
            assert!((zi.norm_sqr() - mi).abs() < 1e-12);
        }
    }

    #[test]
    fn nonlinearity_pulls_dip_to_lower_frequency() {
        // yg = y - a/(1+4y²): on the generator axis the minimum sits below fr.
        let base = linear_params();
        let nl = IqParams { a: 0.5, ..base };
        let x: Vec<f64> = (0..401).map(|i| base.fr + (i as f64 - 200.0) * 100.0).collect();
        let argmin = |z: &[Complex64]| {
            z.iter()
                .enumerate()
                .min_by(|a, b| a.1.norm().partial_cmp(&b.1.norm()).unwrap())
                .unwrap()
                .0
        };
        let lin_min = argmin(&nonlinear_iq(&x, &base).unwrap());
        let nl_min = argmin(&nonlinear_iq(&x, &nl).unwrap());
        assert_eq!(lin_min, 200);
        assert!(nl_min < lin_min);
    }

    #[test]
    fn non_finite_parameters_are_a_numerical_error() {
        let p = IqParams {
            qr: f64::NAN,
            ..linear_params()
        };
        let err = nonlinear_iq(&[3.0e8], &p).unwrap_err();
        assert!(matches!(err, AppError::Numerical(_)));
    }

    #[test]
    fn stacked_prediction_layout() {
        let p = linear_params().to_vec();
        let x = [2.999e8, 3.0e8, 3.001e8];
        let stacked = IqModel::predict(&x, &p).unwrap();
        let z = nonlinear_iq(&x, &IqParams::from_slice(&p).unwrap()).unwrap();
        assert_eq!(stacked.len(), 6);
        assert_eq!(stacked[1], z[1].re);
        assert_eq!(stacked[4], z[1].im);
    }

    #[test]
    fn wrong_parameter_count_is_rejected() {
        assert!(MagModel::predict(&[1.0], &[1.0, 2.0]).is_err());
    }
}
