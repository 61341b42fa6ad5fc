//! Resonance-window segmentation.
//!
//! Given the high-pass magnitude trace (dB) this module:
//!
//! 1. thresholds it into dip regions
//! 2. finds three-point local minima inside every region
//! 3. drops minima closer than the spacing threshold (per region, then globally)
//! 4. partitions the frequency axis into one window per surviving minimum
//!
//! Everything is recomputed from scratch for every threshold.

pub mod conflicts;
pub mod minima;
pub mod regions;
pub mod windows;

pub use conflicts::{Conflict, Resolution, resolve_spacing_conflicts};
pub use minima::find_local_minima;
pub use regions::{RegionScan, find_regions};
pub use windows::{midpoint, partition_windows};

use tracing::{debug, info};

use crate::domain::{Minimum, Region, SegmentConfig, Trace, Window};
use crate::error::AppError;

/// Full result of one segmentation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Segmentation {
    pub regions: Vec<Region>,
    pub below_threshold: Vec<usize>,
    /// Surviving minima, ordered by index.
    pub minima: Vec<Minimum>,
    /// Removals made by the per-region and global passes.
    pub conflicts: Vec<Conflict>,
    pub windows: Vec<Window>,
}

impl Segmentation {
    /// Sample index of every resonator, in window order.
    pub fn resonator_indices(&self) -> Vec<usize> {
        self.windows.iter().map(|w| w.minima).collect()
    }
}

/// Run the whole segmentation on a high-pass trace.
pub fn segment(trace: &Trace, config: &SegmentConfig) -> Result<Segmentation, AppError> {
    config.validate()?;
    if trace.is_empty() {
        return Err(AppError::input("Cannot segment an empty trace."));
    }

    let scan = find_regions(&trace.mags_db, config.peak_threshold_db);
    let mut conflicts = Vec::new();
    let mut candidates = Vec::new();

    for region in &scan.regions {
        let local = find_local_minima(region, &trace.mags_db);
        if local.is_empty() {
            continue;
        }
        let res = resolve_spacing_conflicts(local, &trace.freqs_hz, &trace.mags_db, config.spacing_threshold_hz);
        conflicts.extend(res.conflicts);
        candidates.extend(res.kept);
    }

    let global = resolve_spacing_conflicts(
        candidates,
        &trace.freqs_hz,
        &trace.mags_db,
        config.spacing_threshold_hz,
    );
    conflicts.extend(global.conflicts);
    let minima = global.kept;

    let windows = partition_windows(&minima, &scan.regions, config, trace.len());
    for (k, w) in windows.iter().enumerate() {
        debug!(resonator = k, minima = w.minima, left_max = w.left_max, right_max = w.right_max, "window");
    }
    info!(
        threshold_db = config.peak_threshold_db,
        regions = scan.regions.len(),
        resonators = minima.len(),
        conflicts = conflicts.len(),
        "segmentation complete"
    );

    Ok(Segmentation {
        regions: scan.regions,
        below_threshold: scan.below_threshold,
        minima,
        conflicts,
        windows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand_distr::{Distribution, Normal};

    const DF: f64 = 1.0e4;

    fn gaussian_trace(n: usize, dips: &[(usize, f64, f64)]) -> Trace {
        let freqs: Vec<f64> = (0..n).map(|i| 3.0e8 + i as f64 * DF).collect();
        let mags: Vec<f64> = (0..n)
            .map(|i| {
                dips.iter()
                    .map(|&(c, depth, sigma)| {
                        let u = (i as f64 - c as f64) / sigma;
                        -depth * (-0.5 * u * u).exp()
                    })
                    .sum()
            })
            .collect();
        Trace::new(freqs, mags).unwrap()
    }

    fn assert_invariants(seg: &Segmentation, trace: &Trace, cfg: &SegmentConfig) {
        if let (Some(first), Some(last)) = (seg.windows.first(), seg.windows.last()) {
            assert_eq!(first.left_max, 0);
            assert_eq!(last.right_max, trace.len());
        }
        for pair in seg.windows.windows(2) {
            assert_eq!(pair[0].right_max, pair[1].left_max);
        }
        for w in &seg.windows {
            assert!(w.is_ordered(), "{w:?}");
        }
        for pair in seg.minima.windows(2) {
            let gap = trace.freqs_hz[pair[1].index] - trace.freqs_hz[pair[0].index];
            assert!(gap >= cfg.spacing_threshold_hz);
        }
        let again = resolve_spacing_conflicts(
            seg.minima.clone(),
            &trace.freqs_hz,
            &trace.mags_db,
            cfg.spacing_threshold_hz,
        );
        assert_eq!(again.kept, seg.minima);
    }

    #[test]
    fn two_separated_dips_give_two_windows() {
        let trace = gaussian_trace(1000, &[(300, 6.0, 10.0), (700, 4.0, 10.0)]);
        let cfg = SegmentConfig::default();
        let seg = segment(&trace, &cfg).unwrap();

        assert_eq!(seg.regions.len(), 2);
        let idx = seg.resonator_indices();
        assert_eq!(idx.len(), 2);
        assert!(idx[0].abs_diff(300) <= 1);
        assert!(idx[1].abs_diff(700) <= 1);
        assert_eq!(seg.windows[0].right_max, 500);
        assert_invariants(&seg, &trace, &cfg);
    }

    #[test]
    fn close_dips_keep_only_the_deeper() {
        let cfg = SegmentConfig::default();

        let trace = gaussian_trace(1000, &[(500, 6.0, 1.5), (505, 4.0, 1.5)]);
        let seg = segment(&trace, &cfg).unwrap();
        assert_eq!(seg.resonator_indices(), vec![500]);
        assert_eq!(seg.conflicts.len(), 1);

        let trace = gaussian_trace(1000, &[(500, 4.0, 1.5), (505, 6.0, 1.5)]);
        let seg = segment(&trace, &cfg).unwrap();
        assert_eq!(seg.resonator_indices(), vec![505]);
    }

    #[test]
    fn high_threshold_finds_nothing() {
        let trace = gaussian_trace(200, &[(100, 1.0, 5.0)]);
        let seg = segment(&trace, &SegmentConfig::default()).unwrap();
        assert!(seg.regions.is_empty());
        assert!(seg.minima.is_empty());
        assert!(seg.windows.is_empty());
    }

    #[test]
    fn invariants_hold_across_thresholds_on_noisy_trace() {
        let mut trace = gaussian_trace(
            2000,
            &[
                (150, 8.0, 6.0),
                (171, 5.0, 4.0),
                (600, 12.0, 3.0),
                (1010, 3.0, 8.0),
                (1400, 6.0, 5.0),
                (1990, 7.0, 6.0),
            ],
        );
        let mut rng = StdRng::seed_from_u64(7);
        let noise = Normal::new(0.0, 0.3).unwrap();
        for m in trace.mags_db.iter_mut() {
            *m += noise.sample(&mut rng);
        }

        for threshold in [0.2, 0.5, 1.0, 1.5, 2.5, 4.0, 8.0, 20.0] {
            let cfg = SegmentConfig {
                peak_threshold_db: threshold,
                ..SegmentConfig::default()
            };
            let seg = segment(&trace, &cfg).unwrap();
            assert_invariants(&seg, &trace, &cfg);
        }
    }

    #[test]
    fn invalid_config_is_rejected_before_work() {
        let trace = gaussian_trace(10, &[]);
        let cfg = SegmentConfig {
            fitter_pad_factor: f64::NAN,
            ..SegmentConfig::default()
        };
        assert!(matches!(segment(&trace, &cfg), Err(AppError::Config(_))));
    }
}
