//! Open-Time Deduplication Utilities
//!
//! Klines are keyed by their open time in milliseconds; two rows with the same
//! open time describe the same minute and only one of them may survive.

use crate::models::Timestamped;
use std::collections::{HashMap, HashSet};

/// Streaming deduplicator keyed by open time
#[derive(Debug, Default)]
pub struct OpenTimeDeduplicator {
    seen_keys: HashSet<i64>,
}

impl OpenTimeDeduplicator {
    /// Create a new deduplicator
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if record is duplicate; the first call for a key returns false
    pub fn is_duplicate<T: Timestamped>(&mut self, record: &T) -> bool {
        !self.seen_keys.insert(record.open_time())
    }

    /// Filter duplicates in place, consuming and returning the records
    pub fn filter_duplicates_owned<T: Timestamped>(mut records: Vec<T>, keep_last: bool) -> Vec<T> {
        let mut dedup = Self::new();
        if keep_last {
            records.reverse();
            records.retain(|r| !dedup.is_duplicate(r));
            records.reverse();
        } else {
            records.retain(|r| !dedup.is_duplicate(r));
        }
        records
    }

    /// Open times that occur more than once, with their counts, ascending
    pub fn get_duplicate_info<T: Timestamped>(records: &[T]) -> Vec<(i64, usize)> {
        let mut key_counts: HashMap<i64, usize> = HashMap::new();

        for record in records {
            *key_counts.entry(record.open_time()).or_insert(0) += 1;
        }

        let mut info: Vec<(i64, usize)> = key_counts
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .collect();
        info.sort_unstable();
        info
    }
}
