//! Spacing-conflict resolution between candidate resonances.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::DataIndex;

/// One removal made by [`resolve_spacing_conflicts`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub kept_index: usize,
    pub removed_index: usize,
    pub kept_freq_hz: f64,
    pub removed_freq_hz: f64,
    pub kept_depth_db: f64,
    pub removed_depth_db: f64,
}

/// Survivors plus the removals that produced them, in removal order.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution<T> {
    pub kept: Vec<T>,
    pub conflicts: Vec<Conflict>,
}

/// Drop the shallower of any adjacent pair closer than `threshold_hz`.
///
/// `items` must be ordered by sample index. After every removal the scan
/// restarts from the front, so the result has no adjacent pair closer than
/// the threshold. On equal depth the later entry goes.
pub fn resolve_spacing_conflicts<T: DataIndex>(
    mut items: Vec<T>,
    freqs_hz: &[f64],
    mags_db: &[f64],
    threshold_hz: f64,
) -> Resolution<T> {
    let mut conflicts = Vec::new();

    'scan: loop {
        for k in 0..items.len().saturating_sub(1) {
            let left = items[k].data_index();
            let right = items[k + 1].data_index();
            if (freqs_hz[right] - freqs_hz[left]).abs() >= threshold_hz {
                continue;
            }

            let (drop_pos, kept, removed) = if mags_db[left] > mags_db[right] {
                (k, right, left)
            } else {
                (k + 1, left, right)
            };
            let conflict = Conflict {
                kept_index: kept,
                removed_index: removed,
                kept_freq_hz: freqs_hz[kept],
                removed_freq_hz: freqs_hz[removed],
                kept_depth_db: mags_db[kept],
                removed_depth_db: mags_db[removed],
            };
            warn!(
                kept_freq_hz = conflict.kept_freq_hz,
                kept_depth_db = conflict.kept_depth_db,
                removed_freq_hz = conflict.removed_freq_hz,
                removed_depth_db = conflict.removed_depth_db,
                "resonances closer than spacing threshold; dropping the shallower one"
            );
            conflicts.push(conflict);
            items.remove(drop_pos);
            continue 'scan;
        }
        break;
    }

    Resolution {
        kept: items,
        conflicts,
    }
}
