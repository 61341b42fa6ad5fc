//! Debug bundle writer for inspecting one segmentation pass.
//!
//! The bundle is a markdown file under `debug/` listing every region, minimum,
//! spacing conflict and window, so a surprising window layout can be traced
//! back to the threshold and spacing decisions that produced it.

use std::fs::{File, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::domain::{BaselineConfig, SegmentConfig, Trace, Window};
use crate::error::AppError;
use crate::find::Segmentation;

/// Write the bundle into `dir` and return its path.
pub fn write_debug_bundle(
    dir: &Path,
    source: &str,
    trace: &Trace,
    seg: &Segmentation,
    segment: &SegmentConfig,
    baseline: &BaselineConfig,
) -> Result<PathBuf, AppError> {
    create_dir_all(dir).map_err(|e| AppError::io(format!("Failed to create debug dir: {e}")))?;

    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("kids_debug_thr{:.2}_{ts}.md", segment.peak_threshold_db));

    let mut file = File::create(&path).map_err(|e| AppError::io(format!("Failed to create debug file: {e}")))?;
    let body = render_debug_markdown(source, trace, seg, segment, baseline);
    file.write_all(body.as_bytes())
        .map_err(|e| AppError::io(format!("Failed to write debug file: {e}")))?;
    Ok(path)
}

/// The bundle body, without touching the filesystem.
pub fn render_debug_markdown(
    source: &str,
    trace: &Trace,
    seg: &Segmentation,
    segment: &SegmentConfig,
    baseline: &BaselineConfig,
) -> String {
    let mut out = String::new();
    out.push_str("# kids debug bundle\n");
    out.push_str(&format!("- generated: {}\n", Local::now().to_rfc3339()));
    out.push_str(&format!("- input: {source}\n"));
    out.push_str(&format!("- samples: {}\n", trace.len()));
    out.push_str(&format!(
        "- threshold: {:.3} dB, spacing: {:.1} Hz, smoothing: {:.1} Hz\n",
        segment.peak_threshold_db, segment.spacing_threshold_hz, baseline.smoothing_scale_hz
    ));
    out.push_str(&format!(
        "- pad factors: window {:.3}, fitter {:.3}\n",
        segment.window_pad_factor, segment.fitter_pad_factor
    ));
    out.push_str(&format!("- samples below threshold: {}\n", seg.below_threshold.len()));

    out.push_str(&format!("\n## Regions ({})\n", seg.regions.len()));
    out.push_str("| id | start | end | len | f_start_hz | f_end_hz |\n");
    out.push_str("| - | - | - | - | - | - |\n");
    for r in &seg.regions {
        out.push_str(&format!(
            "| {} | {} | {} | {} | {:.1} | {:.1} |\n",
            r.id,
            r.start,
            r.end,
            r.len(),
            trace.freqs_hz[r.start],
            trace.freqs_hz[r.end]
        ));
    }

    out.push_str(&format!("\n## Minima ({})\n", seg.minima.len()));
    out.push_str("| index | region | offset | freq_hz | mag_db |\n");
    out.push_str("| - | - | - | - | - |\n");
    for m in &seg.minima {
        out.push_str(&format!(
            "| {} | {} | {} | {:.1} | {:.3} |\n",
            m.index, m.region, m.offset, trace.freqs_hz[m.index], trace.mags_db[m.index]
        ));
    }

    out.push_str(&format!("\n## Spacing conflicts ({})\n", seg.conflicts.len()));
    if seg.conflicts.is_empty() {
        out.push_str("None.\n");
    } else {
        out.push_str("| kept | removed | kept_freq_hz | removed_freq_hz | kept_db | removed_db |\n");
        out.push_str("| - | - | - | - | - | - |\n");
        for c in &seg.conflicts {
            out.push_str(&format!(
                "| {} | {} | {:.1} | {:.1} | {:.3} | {:.3} |\n",
                c.kept_index, c.removed_index, c.kept_freq_hz, c.removed_freq_hz, c.kept_depth_db, c.removed_depth_db
            ));
        }
    }

    out.push_str(&format!("\n## Windows ({})\n", seg.windows.len()));
    out.push_str(&format!("| # | {} | ordered |\n", Window::FIELD_NAMES.join(" | ")));
    out.push_str(&format!("|{}\n", " - |".repeat(Window::FIELD_NAMES.len() + 2)));
    for (k, w) in seg.windows.iter().enumerate() {
        let cells: Vec<String> = w.as_array().iter().map(|v| v.to_string()).collect();
        out.push_str(&format!("| {k} | {} | {} |\n", cells.join(" | "), w.is_ordered()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::find::segment;

    fn sample() -> (Trace, Segmentation) {
        let freqs: Vec<f64> = (0..60).map(|k| 1.0e3 * k as f64).collect();
        let mut mags = vec![0.0; 60];
        for (k, v) in [(14, -2.0), (15, -5.0), (16, -3.0), (17, -4.0), (18, -2.0)] {
            mags[k] = v;
        }
        let trace = Trace::new(freqs, mags).unwrap();
        let seg = segment(
            &trace,
            &SegmentConfig {
                spacing_threshold_hz: 5.0e3,
                ..SegmentConfig::default()
            },
        )
        .unwrap();
        (trace, seg)
    }

    #[test]
    fn markdown_lists_every_stage() {
        let (trace, seg) = sample();
        let md = render_debug_markdown(
            "synthetic",
            &trace,
            &seg,
            &SegmentConfig::default(),
            &BaselineConfig::default(),
        );
        assert!(md.contains("## Regions (1)"));
        assert!(md.contains("## Minima (1)"));
        // 17 is within 5 kHz of the deeper 15.
        assert!(md.contains("## Spacing conflicts (1)"));
        assert!(md.contains("| 15 | 17 |"));
        assert!(md.contains("| 0 | 0 | 10 | 14 | 14 | 15 | 18 | 19 | 30 | 60 | true |"));
        assert!(md.trim_end().ends_with("| true |"));
    }

    #[test]
    fn bundle_is_written_to_disk() {
        let (trace, seg) = sample();
        let dir = std::env::temp_dir().join(format!("kids-debug-{}", std::process::id()));
        let path = write_debug_bundle(
            &dir,
            "synthetic",
            &trace,
            &seg,
            &SegmentConfig::default(),
            &BaselineConfig::default(),
        )
        .unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("# kids debug bundle"));
        std::fs::remove_dir_all(&dir).ok();
    }
}
