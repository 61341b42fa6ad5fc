//! Three-point local minima inside regions.

use crate::domain::{Minimum, Region};

/// Local minima of one region.
///
/// Sample `i` qualifies when `mag[i] < mag[i-1]` and `mag[i] <= mag[i+1]`,
/// for every interior triple of the region. Regions shorter than three
/// samples have no interior triple and yield nothing.
pub fn find_local_minima(region: &Region, mags_db: &[f64]) -> Vec<Minimum> {
    if region.len() < 3 {
        return Vec::new();
    }

    (region.start + 1..region.end)
        .filter(|&i| mags_db[i] < mags_db[i - 1] && mags_db[i] <= mags_db[i + 1])
        .map(|i| Minimum {
            index: i,
            region: region.id,
            offset: i - region.start,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(start: usize, end: usize) -> Region {
        Region { id: 7, start, end }
    }

    #[test]
    fn finds_interior_minimum() {
        let mags = [0.0, -2.0, -5.0, -3.0, -2.0, 0.0];
        let minima = find_local_minima(&region(1, 4), &mags);
        assert_eq!(
            minima,
            vec![Minimum {
                index: 2,
                region: 7,
                offset: 1
            }]
        );
    }

    #[test]
    fn flat_bottom_reports_leftmost_sample() {
        // -5 < -2 and -5 <= -5 at index 2; index 3 fails -5 < -5.
        let mags = [0.0, -2.0, -5.0, -5.0, -2.0];
        let minima = find_local_minima(&region(1, 4), &mags);
        assert_eq!(minima.len(), 1);
        assert_eq!(minima[0].index, 2);
    }

    #[test]
    fn several_minima_per_region() {
        let mags = [-2.0, -4.0, -3.0, -6.0, -2.0];
        let idx: Vec<usize> = find_local_minima(&region(0, 4), &mags)
            .iter()
            .map(|m| m.index)
            .collect();
        assert_eq!(idx, vec![1, 3]);
    }

    #[test]
    fn short_regions_are_dropped() {
        let mags = [-3.0, -4.0, -3.0];
        assert!(find_local_minima(&region(0, 1), &mags).is_empty());
        assert!(find_local_minima(&region(1, 1), &mags).is_empty());
    }

    #[test]
    fn region_edges_are_never_minima() {
        // Monotone decreasing: the deepest sample sits on the region edge.
        let mags = [-1.0, -2.0, -3.0, -4.0];
        assert!(find_local_minima(&region(0, 3), &mags).is_empty());
    }
}
