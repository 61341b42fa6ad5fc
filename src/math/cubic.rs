//! Real roots of cubic polynomials.
//!
//! Closed form (Cardano for one real root, trigonometric form for three),
//! followed by a short Newton polish on the original polynomial. Complex
//! roots are never returned.

use std::f64::consts::PI;

/// Newton iterations applied to every closed-form root.
const POLISH_STEPS: usize = 2;

/// Real roots of `a·y³ + b·y² + c·y + d = 0`, ascending.
///
/// Returns an empty vector when the coefficients are not finite or `a == 0`.
pub fn real_cubic_roots(a: f64, b: f64, c: f64, d: f64) -> Vec<f64> {
    if !(a.is_finite() && b.is_finite() && c.is_finite() && d.is_finite()) || a == 0.0 {
        return Vec::new();
    }

    let bn = b / a;
    let cn = c / a;
    let dn = d / a;
    let shift = bn / 3.0;

    // Depressed cubic t³ + p·t + q = 0 with y = t - b/3.
    let p = cn - bn * bn / 3.0;
    let q = 2.0 * bn * bn * bn / 27.0 - bn * cn / 3.0 + dn;
    let disc = (q / 2.0).powi(2) + (p / 3.0).powi(3);

    let mut roots: Vec<f64> = if disc > 0.0 {
        let s = disc.sqrt();
        // Take the larger-magnitude cube root first to avoid cancellation.
        let u = (-q / 2.0 - q.signum() * s).cbrt();
        let t = if u != 0.0 { u - p / (3.0 * u) } else { 0.0 };
        vec![t - shift]
    } else if disc == 0.0 {
        if p == 0.0 {
            vec![-shift]
        } else {
            vec![3.0 * q / p - shift, -3.0 * q / (2.0 * p) - shift]
        }
    } else {
        let r = 2.0 * (-p / 3.0).sqrt();
        let arg = (3.0 * q / (2.0 * p) * (-3.0 / p).sqrt()).clamp(-1.0, 1.0);
        let phi = arg.acos();
        (0..3)
            .map(|k| r * (phi / 3.0 - 2.0 * PI * k as f64 / 3.0).cos() - shift)
            .collect()
    };

    for y in roots.iter_mut() {
        *y = polish(*y, bn, cn, dn);
    }
    roots.retain(|y| y.is_finite());
    roots.sort_by(|x, y| x.partial_cmp(y).unwrap_or(std::cmp::Ordering::Equal));
    roots
}

/// Largest real root of `a·y³ + b·y² + c·y + d = 0`.
pub fn largest_real_root(a: f64, b: f64, c: f64, d: f64) -> Option<f64> {
    real_cubic_roots(a, b, c, d).last().copied()
}

fn polish(mut y: f64, bn: f64, cn: f64, dn: f64) -> f64 {
    let eval = |y: f64| ((y + bn) * y + cn) * y + dn;
    let mut fy = eval(y);
    for _ in 0..POLISH_STEPS {
        let dfy = (3.0 * y + 2.0 * bn) * y + cn;
        if dfy == 0.0 || !dfy.is_finite() {
            break;
        }
        let next = y - fy / dfy;
        let fnext = eval(next);
        if !(fnext.abs() < fy.abs()) {
            break;
        }
        y = next;
        fy = fnext;
    }
    y
}
