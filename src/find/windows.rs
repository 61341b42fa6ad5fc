//! Partition of the trace into per-resonator windows.

use crate::domain::{Minimum, Region, SegmentConfig, Window};

/// Integer midpoint of two sample indices, ties to even.
pub fn midpoint(a: usize, b: usize) -> usize {
    ((a + b) as f64 / 2.0).round_ties_even() as usize
}

/// One window per minimum.
///
/// `minima` must be the globally resolved, index-ordered survivors; every
/// minimum's `region` id refers into `regions`. Read as `[left_max, right_max)`
/// the windows tile `[0, len)`.
pub fn partition_windows(
    minima: &[Minimum],
    regions: &[Region],
    config: &SegmentConfig,
    len: usize,
) -> Vec<Window> {
    let last = minima.len().saturating_sub(1);

    minima
        .iter()
        .enumerate()
        .map(|(k, m)| {
            let prev = k.checked_sub(1).map(|p| &minima[p]);
            let next = if k < last { Some(&minima[k + 1]) } else { None };

            let left_max = prev.map_or(0, |p| midpoint(p.index, m.index));
            let right_max = next.map_or(len, |n| midpoint(m.index, n.index));

            let (region_start, region_end) = regions
                .iter()
                .find(|r| r.id == m.region)
                .map_or((m.index, m.index), |r| (r.start, r.end));

            let left_window = match prev {
                Some(p) if p.region == m.region => left_max,
                _ => region_start.max(left_max),
            };
            let right_window = match next {
                Some(n) if n.region == m.region => right_max,
                _ => region_end.min(right_max),
            };

            let left_pad = left_of(m.index, left_window, config.window_pad_factor).clamp(left_max, left_window);
            let left_fitter_pad = left_of(m.index, left_window, config.fitter_pad_factor).clamp(left_max, left_pad);
            let right_pad = right_of(m.index, right_window, config.window_pad_factor).clamp(right_window, right_max);
            let right_fitter_pad =
                right_of(m.index, right_window, config.fitter_pad_factor).clamp(right_pad, right_max);

            Window {
                left_max,
                left_fitter_pad,
                left_pad,
                left_window,
                minima: m.index,
                right_window,
                right_pad,
                right_fitter_pad,
                right_max,
            }
        })
        .collect()
}

fn scaled(extent: usize, factor: f64) -> usize {
    (factor * extent as f64).round_ties_even() as usize
}

fn left_of(center: usize, edge: usize, factor: f64) -> usize {
    center.saturating_sub(scaled(center - edge, factor))
}

fn right_of(center: usize, edge: usize, factor: f64) -> usize {
    center.saturating_add(scaled(edge - center, factor))
}
