//! Raised-cosine FFT low-pass.

use std::f64::consts::PI;

use rustfft::FftPlanner;
use rustfft::num_complex::Complex64;

use crate::error::AppError;
use crate::signal::BaselineExtractor;

/// Low-pass with a raised-cosine roll-off, applied in the Fourier domain of
/// a mirror-padded copy of the data (reversed, data, reversed) to suppress
/// edge transients.
///
/// Odd-length input loses its last sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CosineLowpass {
    /// Sample period of the input (for a sweep: the frequency step in Hz).
    pub sample_period: f64,
    /// Corner of the transfer function, in cycles per unit of `sample_period`.
    pub f_3db: f64,
    /// Width of the roll-off band centred on `f_3db`.
    pub width: f64,
}

impl CosineLowpass {
    /// Baseline filter for a sweep: `f_3db = 1 / smoothing_scale`, roll-off a tenth of that.
    pub fn for_sweep(sample_spacing_hz: f64, smoothing_scale_hz: f64) -> Result<Self, AppError> {
        if !(sample_spacing_hz.is_finite() && sample_spacing_hz > 0.0) {
            return Err(AppError::input(format!(
                "Sample spacing must be positive (got {sample_spacing_hz})."
            )));
        }
        if !(smoothing_scale_hz.is_finite() && smoothing_scale_hz > 0.0) {
            return Err(AppError::config("Smoothing scale must be finite and > 0."));
        }
        let f_3db = 1.0 / smoothing_scale_hz;
        Ok(Self {
            sample_period: sample_spacing_hz,
            f_3db,
            width: 0.1 * f_3db,
        })
    }

    /// Transfer function at absolute frequency `f`.
    pub fn transfer(&self, f: f64) -> f64 {
        let lo = self.f_3db - self.width / 2.0;
        let hi = self.f_3db + self.width / 2.0;
        if f < lo {
            1.0
        } else if f >= hi {
            0.0
        } else {
            (1.0 + (-PI * (f - self.f_3db) / self.width).sin()) / 2.0
        }
    }
}

impl BaselineExtractor for CosineLowpass {
    fn baseline(&self, data: &[f64]) -> Result<Vec<f64>, AppError> {
        let n = data.len() - data.len() % 2;
        if n < 2 {
            return Err(AppError::input("Low-pass filter needs at least two samples."));
        }
        let data = &data[..n];

        let mut buf: Vec<Complex64> = data
            .iter()
            .rev()
            .chain(data.iter())
            .chain(data.iter().rev())
            .map(|&v| Complex64::new(v, 0.0))
            .collect();
        let total = buf.len();

        let mut planner = FftPlanner::<f64>::new();
        planner.plan_fft_forward(total).process(&mut buf);

        let df = 1.0 / (total as f64 * self.sample_period);
        for (k, v) in buf.iter_mut().enumerate() {
            let f = k.min(total - k) as f64 * df;
            *v *= self.transfer(f);
        }

        planner.plan_fft_inverse(total).process(&mut buf);
        let scale = 1.0 / total as f64;
        Ok(buf[n..2 * n].iter().map(|v| v.re * scale).collect())
    }
}
