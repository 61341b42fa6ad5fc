//! Threshold segmentation of the high-pass trace.

use crate::domain::Region;

/// Regions below `-threshold_db` plus every in-threshold sample index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionScan {
    pub regions: Vec<Region>,
    pub below_threshold: Vec<usize>,
}

/// Group contiguous samples with `mag < -threshold_db` into regions.
///
/// A region still open at the end of the trace is closed at the last sample.
/// NaN samples never count as below threshold.
pub fn find_regions(mags_db: &[f64], threshold_db: f64) -> RegionScan {
    let mut scan = RegionScan::default();
    let mut open: Option<usize> = None;

    for (i, &m) in mags_db.iter().enumerate() {
        let inside = m < -threshold_db;
        if inside {
            scan.below_threshold.push(i);
        }
        match (open, inside) {
            (None, true) => open = Some(i),
            (Some(start), false) => {
                scan.regions.push(Region {
                    id: scan.regions.len(),
                    start,
                    end: i - 1,
                });
                open = None;
            }
            _ => {}
        }
    }

    if let Some(start) = open {
        scan.regions.push(Region {
            id: scan.regions.len(),
            start,
            end: mags_db.len() - 1,
        });
    }

    scan
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_disjoint_runs() {
        let mags = [0.0, -2.0, -3.0, 0.0, 0.0, -2.0, -1.0, -4.0];
        let scan = find_regions(&mags, 1.5);
        assert_eq!(
            scan.regions,
            vec![
                Region { id: 0, start: 1, end: 2 },
                Region { id: 1, start: 5, end: 5 },
                Region { id: 2, start: 7, end: 7 },
            ]
        );
        assert_eq!(scan.below_threshold, vec![1, 2, 5, 7]);
    }

    #[test]
    fn run_touching_both_edges_is_one_region() {
        let scan = find_regions(&[-5.0; 4], 1.0);
        assert_eq!(scan.regions, vec![Region { id: 0, start: 0, end: 3 }]);
    }

    #[test]
    fn threshold_selecting_nothing_yields_no_regions() {
        let scan = find_regions(&[0.0, -0.5, -1.0], 3.0);
        assert!(scan.regions.is_empty());
        assert!(scan.below_threshold.is_empty());
    }

    #[test]
    fn boundary_value_is_not_below_threshold() {
        let scan = find_regions(&[-1.5, -1.6], 1.5);
        assert_eq!(scan.below_threshold, vec![1]);
    }
}
