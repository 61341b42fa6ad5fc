//! Synthetic multi-resonator sweeps.
//!
//! Every resonator contributes its IQ-model resonance factor; the product is
//! scaled by a slow gain ripple, rotated by a cable delay, and Gaussian noise
//! is added to I and Q. Everything is driven by one seeded `StdRng`, so a seed
//! reproduces the sweep exactly.

use std::f64::consts::PI;

use num_complex::Complex64;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use serde::{Deserialize, Serialize};

use crate::domain::Sweep;
use crate::error::AppError;
use crate::models::{IqParams, nonlinear_iq};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthConfig {
    pub start_hz: f64,
    pub stop_hz: f64,
    pub points: usize,
    pub resonators: usize,
    pub qr_min: f64,
    pub qr_max: f64,
    pub amp_min: f64,
    pub amp_max: f64,
    /// Upper end of the nonlinearity draw (lower end is 0).
    pub a_max: f64,
    pub tau_s: f64,
    /// Peak-to-peak gain ripple in dB.
    pub ripple_db: f64,
    pub ripple_period_hz: f64,
    /// Standard deviation of the I and Q noise.
    pub noise: f64,
    pub seed: u64,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            start_hz: 3.0e8,
            stop_hz: 3.4e8,
            points: 8000,
            resonators: 8,
            qr_min: 1.0e4,
            qr_max: 4.0e4,
            amp_min: 0.5,
            amp_max: 0.9,
            a_max: 0.5,
            tau_s: 5.0e-8,
            ripple_db: 2.0,
            ripple_period_hz: 2.5e7,
            noise: 1.0e-3,
            seed: 42,
        }
    }
}

impl SynthConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if !(self.start_hz.is_finite() && self.stop_hz.is_finite() && self.stop_hz > self.start_hz) {
            return Err(AppError::config("Synthetic sweep needs start < stop."));
        }
        if self.points < 2 {
            return Err(AppError::config("Synthetic sweep needs at least two points."));
        }
        if !(self.qr_min > 0.0 && self.qr_max >= self.qr_min) {
            return Err(AppError::config("Invalid Qr range."));
        }
        if !(self.amp_min > 0.0 && self.amp_max >= self.amp_min) {
            return Err(AppError::config("Invalid coupling range."));
        }
        if !(self.a_max >= 0.0 && self.noise >= 0.0 && self.ripple_period_hz > 0.0) {
            return Err(AppError::config("Nonlinearity, noise and ripple period must be non-negative."));
        }
        Ok(())
    }
}

/// A generated sweep plus the parameters that produced it.
#[derive(Debug, Clone)]
pub struct SynthSweep {
    pub sweep: Sweep,
    /// One entry per resonator, ascending in `fr`.
    pub truth: Vec<IqParams>,
}

pub fn generate_sweep(config: &SynthConfig) -> Result<SynthSweep, AppError> {
    config.validate()?;
    let mut rng = StdRng::seed_from_u64(config.seed);
    let normal = Normal::new(0.0, config.noise.max(f64::MIN_POSITIVE))
        .map_err(|e| AppError::config(format!("Noise distribution error: {e}")))?;

    let df = (config.stop_hz - config.start_hz) / (config.points - 1) as f64;
    let freqs: Vec<f64> = (0..config.points)
        .map(|i| config.start_hz + i as f64 * df)
        .collect();

    // Resonators sit in equal slots with a random offset, away from the slot edges.
    let slot = (config.stop_hz - config.start_hz) / config.resonators.max(1) as f64;
    let truth: Vec<IqParams> = (0..config.resonators)
        .map(|r| {
            let fr = config.start_hz + slot * (r as f64 + rng.gen_range(0.3..0.7));
            IqParams {
                fr,
                qr: rng.gen_range(config.qr_min..=config.qr_max),
                amp: rng.gen_range(config.amp_min..=config.amp_max),
                phi: rng.gen_range(-0.3..0.3),
                a: rng.gen_range(0.0..=config.a_max),
                i0: 1.0,
                q0: 0.0,
                tau: 0.0,
                f0: fr,
            }
        })
        .collect();

    let mut z = vec![Complex64::new(1.0, 0.0); freqs.len()];
    for p in &truth {
        let s = nonlinear_iq(&freqs, p)?;
        for (acc, v) in z.iter_mut().zip(s) {
            *acc *= v;
        }
    }

    for (v, &f) in z.iter_mut().zip(&freqs) {
        let phase = 2.0 * PI * (f - config.start_hz) / config.ripple_period_hz;
        let gain_db = 0.5 * config.ripple_db * phase.sin();
        let gain = 10f64.powf(gain_db / 20.0);
        let delay = Complex64::from_polar(1.0, -2.0 * PI * (f - config.start_hz) * config.tau_s);
        *v = *v * gain * delay;
        if config.noise > 0.0 {
            *v += Complex64::new(normal.sample(&mut rng), normal.sample(&mut rng));
        }
    }

    Ok(SynthSweep {
        sweep: Sweep::new(freqs, z)?,
        truth,
    })
}
