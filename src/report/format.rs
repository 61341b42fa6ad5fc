//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the segmentation/fitting code stays clean and testable
//! - output changes are localized

use crate::domain::{BaselineConfig, FitOutcome, ResonatorFit, ResonatorFits, SegmentConfig};
use crate::find::Segmentation;
use crate::report::ResonanceRow;

/// Summary of one `find` run: settings, counts and the resonance table.
pub fn format_find_summary(
    source: &str,
    samples: usize,
    segment: &SegmentConfig,
    baseline: &BaselineConfig,
    seg: &Segmentation,
    rows: &[ResonanceRow],
) -> String {
    let mut out = String::new();

    out.push_str("=== kids - KID resonance finder ===\n");
    out.push_str(&format!("Input: {source} ({samples} samples)\n"));
    out.push_str(&format!(
        "Threshold: {:.2} dB | spacing: {} | smoothing: {}\n",
        segment.peak_threshold_db,
        fmt_hz(segment.spacing_threshold_hz),
        fmt_hz(baseline.smoothing_scale_hz),
    ));
    out.push_str(&format!(
        "Pads: window x{:.2} | fitter x{:.2}\n",
        segment.window_pad_factor, segment.fitter_pad_factor
    ));
    out.push_str(&format!(
        "Regions: {} ({} samples below threshold) | resonances: {} | spacing conflicts: {}\n",
        seg.regions.len(),
        seg.below_threshold.len(),
        rows.len(),
        seg.conflicts.len(),
    ));
    out.push('\n');
    out.push_str(&format_resonance_table(rows));
    out
}

/// One line per resonance.
pub fn format_resonance_table(rows: &[ResonanceRow]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:>4} {:>8} {:>6} {:>16} {:>9} {:>12} {:>8}\n",
        "#", "index", "region", "freq_hz", "depth_db", "iq_speed", "span"
    ));
    out.push_str(&format!(
        "{:->4} {:->8} {:->6} {:->16} {:->9} {:->12} {:->8}\n",
        "", "", "", "", "", "", ""
    ));
    for r in rows {
        let speed = r.iq_speed.map(|v| format!("{v:.4e}")).unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "{:>4} {:>8} {:>6} {:>16.1} {:>9.2} {:>12} {:>8}\n",
            r.resonator, r.index, r.region, r.freq_hz, r.depth_db, speed, r.span
        ));
    }
    out
}

/// One line per resonator with the headline parameters of both fits.
pub fn format_fit_table(fits: &[ResonatorFits]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:>4} {:>8} | {:>16} {:>10} {:>6} {:>10} | {:>16} {:>10} {:>6}\n",
        "#", "index", "iq fr_hz", "iq Qr", "iq a", "iq rmse", "mag fr_hz", "mag Qr", "mag a"
    ));
    out.push_str(&format!(
        "{:->4} {:->8} | {:->16} {:->10} {:->6} {:->10} | {:->16} {:->10} {:->6}\n",
        "", "", "", "", "", "", "", "", ""
    ));

    for r in fits {
        let iq = match &r.iq {
            FitOutcome::Fitted(fit) => format!(
                "{:>16.1} {:>10.0} {:>6.3} {:>10.3e}",
                fit.param("fr").unwrap_or(f64::NAN),
                fit.param("Qr").unwrap_or(f64::NAN),
                fit.param("a").unwrap_or(f64::NAN),
                fit.quality.rmse,
            ),
            FitOutcome::Failed { .. } => format!("{:>16} {:>10} {:>6} {:>10}", "failed", "-", "-", "-"),
        };
        let mag = match &r.magnitude {
            FitOutcome::Fitted(fit) => format!(
                "{:>16.1} {:>10.0} {:>6.3}",
                fit.param("fr").unwrap_or(f64::NAN),
                fit.param("Qr").unwrap_or(f64::NAN),
                fit.param("a").unwrap_or(f64::NAN),
            ),
            FitOutcome::Failed { .. } => format!("{:>16} {:>10} {:>6}", "failed", "-", "-"),
        };
        out.push_str(&format!("{:>4} {:>8} | {iq} | {mag}\n", r.resonator, r.minima));
    }

    let failed: Vec<String> = fits
        .iter()
        .flat_map(|r| {
            [("iq", &r.iq), ("mag", &r.magnitude)]
                .into_iter()
                .filter_map(move |(label, o)| match o {
                    FitOutcome::Failed { reason } => Some(format!("  #{} {label}: {reason}", r.resonator)),
                    FitOutcome::Fitted(_) => None,
                })
        })
        .collect();
    if !failed.is_empty() {
        out.push_str("\nFailures:\n");
        for line in failed {
            out.push_str(&line);
            out.push('\n');
        }
    }
    out
}

/// Every parameter of one fit, with its starting value and standard error.
pub fn format_fit_params(fit: &ResonatorFit) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} fit: n={} evals={} SSE={:.4e} RMSE={:.4e} chi2_red={:.4e}\n",
        fit.model.display_name(),
        fit.quality.n,
        fit.quality.iterations,
        fit.quality.sse,
        fit.quality.rmse,
        fit.quality.reduced_chi2,
    ));
    for p in &fit.params {
        let stderr = p.stderr.map(|s| format!("{s:.4e}")).unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "  {:<5} {:>16.6e} (start {:>14.6e}, stderr {stderr})\n",
            p.name, p.value, p.initial
        ));
    }
    out
}

fn fmt_hz(v: f64) -> String {
    let a = v.abs();
    if a >= 1.0e9 {
        format!("{:.3} GHz", v / 1.0e9)
    } else if a >= 1.0e6 {
        format!("{:.3} MHz", v / 1.0e6)
    } else if a >= 1.0e3 {
        format!("{:.3} kHz", v / 1.0e3)
    } else {
        format!("{v:.3} Hz")
    }
}
