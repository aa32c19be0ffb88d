//! Preprocessing
//!
//! Brings raw klines into the shape the gap filler expects: unique open times
//! sorted ascending. Duplicates keep their first occurrence in file order.

use tracing::{debug, warn};

use crate::error::Result;
use crate::models::Kline;
use crate::services::normalizer::ensure_strictly_increasing;
use crate::utils::deduplication::OpenTimeDeduplicator;

/// What preprocessing changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreprocessStats {
    pub input_rows: usize,
    pub duplicates_removed: usize,
    /// Input was not already ascending
    pub reordered: bool,
}

/// Deduplicate by open time (first occurrence wins) and sort ascending
pub fn clear_raw(klines: Vec<Kline>) -> (Vec<Kline>, PreprocessStats) {
    let input_rows = klines.len();

    let duplicated = OpenTimeDeduplicator::get_duplicate_info(&klines);
    let mut klines = OpenTimeDeduplicator::filter_duplicates_owned(klines, false);
    let duplicates_removed = input_rows - klines.len();
    if let Some(&(first_open_time, count)) = duplicated.first() {
        warn!(
            duplicates_removed,
            open_times = duplicated.len(),
            first_open_time,
            count,
            "Dropped klines with duplicate open_time"
        );
    }

    let reordered = !klines.windows(2).all(|w| w[0].open_time < w[1].open_time);
    if reordered {
        debug!(rows = klines.len(), "Sorting klines by open_time");
        klines.sort_by_key(|k| k.open_time);
    }

    (
        klines,
        PreprocessStats {
            input_rows,
            duplicates_removed,
            reordered,
        },
    )
}

/// Clean the input and assert the gap filler's precondition
pub fn prepare(klines: Vec<Kline>) -> Result<(Vec<Kline>, PreprocessStats)> {
    let (klines, stats) = clear_raw(klines);
    ensure_strictly_increasing(&klines)?;
    Ok((klines, stats))
}
