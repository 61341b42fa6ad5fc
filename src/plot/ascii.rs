//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - trace / fitted curve: `-` line
//! - threshold: `.` line
//! - resonance minima: `v`
//! - fitted data points: `o`

use crate::domain::{Curve, ResonatorFit, Trace};

/// Render the high-pass trace with the threshold line and minima markers.
///
/// When the trace has more samples than columns, each column shows its
/// deepest sample so narrow dips stay visible.
pub fn render_trace_plot(
    trace: &Trace,
    minima: &[usize],
    threshold_db: f64,
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);
    let Some((f_min, f_max)) = finite_range(trace.freqs_hz.iter().copied()) else {
        return "Plot: (no data)\n".to_string();
    };

    let mut columns: Vec<Option<(f64, f64)>> = vec![None; width];
    for (&f, &m) in trace.freqs_hz.iter().zip(&trace.mags_db) {
        if !m.is_finite() {
            continue;
        }
        let col = &mut columns[map_x(f, f_min, f_max, width)];
        if col.is_none_or(|(_, best)| m < best) {
            *col = Some((f, m));
        }
    }
    let line: Vec<(f64, f64)> = columns.into_iter().flatten().collect();

    let markers: Vec<(f64, f64, char)> = minima
        .iter()
        .filter_map(|&k| Some((*trace.freqs_hz.get(k)?, *trace.mags_db.get(k)?, 'v')))
        .collect();

    let level = -threshold_db;
    let Some((y_min, y_max)) = finite_range(line.iter().map(|p| p.1).chain([level])) else {
        return "Plot: (no data)\n".to_string();
    };
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut out = format!(
        "Plot: f=[{:.6}, {:.6}] MHz | mag=[{y_min:.2}, {y_max:.2}] dB | threshold {level:.2} dB\n",
        f_min / 1.0e6,
        f_max / 1.0e6
    );
    let grid = render_grid(&line, &markers, Some(level), (f_min, f_max), (y_min, y_max), width, height);
    out.push_str(&grid);
    out
}

/// Render one fit: data `|S21|` (dB) as points, fitted curve as a line.
pub fn render_fit_plot(fit: &ResonatorFit, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let data: Vec<(f64, f64, char)> = fit
        .freqs_hz
        .iter()
        .zip(&fit.data)
        .map(|(&f, z)| (f, 20.0 * z.norm().log10(), 'o'))
        .collect();
    let curve_db: Vec<f64> = match &fit.fit_curve {
        Curve::Complex(v) => v.iter().map(|z| 20.0 * z.norm().log10()).collect(),
        Curve::Real(v) => v.iter().map(|p| 10.0 * p.log10()).collect(),
    };
    let line: Vec<(f64, f64)> = fit.freqs_hz.iter().copied().zip(curve_db).collect();

    let Some((f_min, f_max)) = finite_range(fit.freqs_hz.iter().copied()) else {
        return "Plot: (no data)\n".to_string();
    };
    let Some((y_min, y_max)) = finite_range(line.iter().map(|p| p.1).chain(data.iter().map(|p| p.1))) else {
        return "Plot: (no data)\n".to_string();
    };
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut out = format!(
        "Plot: {} fit | f=[{:.6}, {:.6}] MHz | mag=[{y_min:.2}, {y_max:.2}] dB\n",
        fit.model.display_name(),
        f_min / 1.0e6,
        f_max / 1.0e6
    );
    out.push_str(&render_grid(&line, &data, None, (f_min, f_max), (y_min, y_max), width, height));
    out
}

fn render_grid(
    line: &[(f64, f64)],
    markers: &[(f64, f64, char)],
    hline: Option<f64>,
    (x_min, x_max): (f64, f64),
    (y_min, y_max): (f64, f64),
    width: usize,
    height: usize,
) -> String {
    let mut grid = vec![vec![' '; width]; height];

    // Curve first, then the threshold into the gaps, markers on top.
    draw_curve(&mut grid, line, x_min, x_max, y_min, y_max);
    if let Some(level) = hline {
        let row = map_y(level, y_min, y_max, height);
        for cell in grid[row].iter_mut().filter(|c| **c == ' ') {
            *cell = '.';
        }
    }
    for &(x, y, ch) in markers {
        if x.is_finite() && y.is_finite() {
            grid[map_y(y, y_min, y_max, height)][map_x(x, x_min, x_max, width)] = ch;
        }
    }

    let mut out = String::new();
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out
}

fn finite_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values.filter(|v| v.is_finite()) {
        min = min.min(v);
        max = max.max(v);
    }
    if min.is_finite() && max.is_finite() && max > min {
        Some((min, max))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(grid: &mut [Vec<char>], curve: &[(f64, f64)], x_min: f64, x_max: f64, y_min: f64, y_max: f64) {
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(x, y) in curve.iter().filter(|(x, y)| x.is_finite() && y.is_finite()) {
        let col = map_x(x, x_min, x_max, width);
        let row = map_y(y, y_min, y_max, height);
        if let Some((c0, r0)) = prev {
            draw_line(grid, c0, r0, col, row, '-');
        } else {
            grid[row][col] = '-';
        }
        prev = Some((col, row));
    }
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FitQuality, ModelKind};
    use num_complex::Complex64;

    #[test]
    fn trace_plot_golden_snapshot_small() {
        let freqs: Vec<f64> = (0..10).map(|k| k as f64).collect();
        let mags = vec![0.0, 0.0, 0.0, -1.0, -4.0, -1.0, 0.0, 0.0, 0.0, 0.0];
        let trace = Trace::new(freqs, mags).unwrap();

        let txt = render_trace_plot(&trace, &[4], 1.5, 10, 5);
        let expected = concat!(
            "Plot: f=[0.000000, 0.000009] MHz | mag=[-4.20, 0.20] dB | threshold -1.50 dB\n",
            "---   ----\n",
            "   - -    \n",
            "...-.-....\n",
            "    -     \n",
            "    v     \n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn narrow_dip_survives_column_binning() {
        let freqs: Vec<f64> = (0..1000).map(|k| k as f64).collect();
        let mut mags = vec![0.0; 1000];
        mags[503] = -10.0;
        let trace = Trace::new(freqs, mags).unwrap();

        let txt = render_trace_plot(&trace, &[503], 3.0, 20, 6);
        let bottom = txt.lines().last().unwrap();
        assert_eq!(bottom.trim(), "v");
    }

    #[test]
    fn flat_input_reports_no_data() {
        let trace = Trace::new(vec![1.0], vec![0.0]).unwrap();
        assert_eq!(render_trace_plot(&trace, &[], 1.0, 10, 5), "Plot: (no data)\n");
    }

    #[test]
    fn fit_plot_draws_points_and_curve() {
        let freqs: Vec<f64> = (0..5).map(|k| 1.0e8 + k as f64 * 1.0e3).collect();
        let data: Vec<Complex64> = [1.0, 0.8, 0.2, 0.8, 1.0].iter().map(|&m| Complex64::new(m, 0.0)).collect();
        let fit = ResonatorFit {
            model: ModelKind::Iq,
            params: Vec::new(),
            quality: FitQuality {
                sse: 0.0,
                rmse: 0.0,
                reduced_chi2: 0.0,
                n: 5,
                iterations: 1,
            },
            freqs_hz: freqs,
            data: data.clone(),
            fit_curve: Curve::Complex(data.clone()),
            guess_curve: Curve::Complex(data),
        };
        let txt = render_fit_plot(&fit, 10, 5);
        assert!(txt.starts_with("Plot: IQ fit"));
        let points: usize = txt.lines().skip(1).map(|l| l.matches('o').count()).sum();
        assert_eq!(points, 5);
    }
}
