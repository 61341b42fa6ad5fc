//! Savitzky–Golay smoothing and differentiation.
//!
//! A polynomial of degree `order` is least-squares fitted to each run of
//! `window` samples. Interior samples use the centred fit; the first and last
//! `window / 2` samples evaluate the fit of the first/last full window at their
//! own position, so polynomials up to `order` pass through exactly, edges included.

use nalgebra::DMatrix;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavitzkyGolay {
    window: usize,
    order: usize,
}

impl SavitzkyGolay {
    pub fn new(window: usize, order: usize) -> Result<Self, AppError> {
        if window % 2 == 0 || window < 3 {
            return Err(AppError::config(format!(
                "Savitzky-Golay window must be odd and >= 3 (got {window})."
            )));
        }
        if order >= window {
            return Err(AppError::config(format!(
                "Savitzky-Golay order {order} must be below the window {window}."
            )));
        }
        Ok(Self { window, order })
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Weights that evaluate the `deriv`-th derivative of the window fit at
    /// offset `at` from the window centre (unit sample spacing).
    fn weights(&self, at: f64, deriv: usize) -> Result<Vec<f64>, AppError> {
        let half = (self.window / 2) as f64;
        let p = self.order + 1;
        let design = DMatrix::<f64>::from_fn(self.window, p, |i, k| (i as f64 - half).powi(k as i32));
        let pinv = design
            .pseudo_inverse(1e-12)
            .map_err(|e| AppError::numerical(format!("Savitzky-Golay design is singular: {e}")))?;

        Ok((0..self.window)
            .map(|i| {
                (deriv..p)
                    .map(|k| {
                        let falling: f64 = (k - deriv + 1..=k).map(|v| v as f64).product();
                        pinv[(k, i)] * falling * at.powi((k - deriv) as i32)
                    })
                    .sum()
            })
            .collect())
    }

    /// Smoothed data (`deriv == 0`) or its `deriv`-th derivative for sample spacing `delta`.
    pub fn apply(&self, data: &[f64], deriv: usize, delta: f64) -> Result<Vec<f64>, AppError> {
        let n = data.len();
        if n < self.window {
            return Err(AppError::input(format!(
                "Savitzky-Golay window {} is longer than the data ({n} samples).",
                self.window
            )));
        }
        let half = self.window / 2;
        let scale = delta.powi(deriv as i32);
        let centre = self.weights(0.0, deriv)?;

        let dot = |w: &[f64], start: usize| -> f64 {
            w.iter().zip(&data[start..start + self.window]).map(|(a, b)| a * b).sum::<f64>() / scale
        };

        let mut out = Vec::with_capacity(n);
        for i in 0..n {
            let value = if i < half {
                dot(&self.weights(i as f64 - half as f64, deriv)?, 0)
            } else if i >= n - half {
                let start = n - self.window;
                dot(&self.weights((i - start) as f64 - half as f64, deriv)?, start)
            } else {
                dot(&centre, i - half)
            };
            out.push(value);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cubic(x: f64) -> f64 {
        2.0 + 0.5 * x - 0.1 * x * x + 0.01 * x * x * x
    }

    fn cubic_slope(x: f64) -> f64 {
        0.5 - 0.2 * x + 0.03 * x * x
    }

    #[test]
    fn reproduces_cubic_and_its_derivative_everywhere() {
        let delta = 0.5;
        let x: Vec<f64> = (0..40).map(|i| i as f64 * delta).collect();
        let y: Vec<f64> = x.iter().map(|&v| cubic(v)).collect();
        let sg = SavitzkyGolay::new(13, 3).unwrap();

        let smooth = sg.apply(&y, 0, delta).unwrap();
        let slope = sg.apply(&y, 1, delta).unwrap();
        for (k, &xi) in x.iter().enumerate() {
            assert!((smooth[k] - cubic(xi)).abs() < 1e-9, "smooth at {k}");
            assert!((slope[k] - cubic_slope(xi)).abs() < 1e-9, "slope at {k}");
        }
    }

    #[test]
    fn smoothing_reduces_alternating_noise() {
        let y: Vec<f64> = (0..30).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let out = SavitzkyGolay::new(13, 3).unwrap().apply(&y, 0, 1.0).unwrap();
        assert!(out[6..24].iter().all(|v| v.abs() < 0.5));
    }

    #[test]
    fn rejects_bad_shapes() {
        assert!(SavitzkyGolay::new(12, 3).is_err());
        assert!(SavitzkyGolay::new(5, 5).is_err());
        let sg = SavitzkyGolay::new(13, 3).unwrap();
        assert!(matches!(sg.apply(&[1.0; 12], 0, 1.0), Err(AppError::Input(_))));
    }
}
