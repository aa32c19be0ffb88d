pub mod deduplication;

use chrono::{DateTime, Utc};
use std::path::PathBuf;

use crate::constants::{DEFAULT_READ_DIR, DEFAULT_WRITE_DIR};
use crate::error::Result;
use crate::models::parse_cutoff_date;

pub use deduplication::OpenTimeDeduplicator;

/// Get raw kline directory from environment variable or use default
pub fn get_read_dir() -> PathBuf {
    std::env::var("KLINES_READ_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_READ_DIR))
}

/// Get processed kline directory from environment variable or use default
pub fn get_write_dir() -> PathBuf {
    std::env::var("KLINES_WRITE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_WRITE_DIR))
}

/// Staleness cut-off override from `KLINES_MIN_LAST_DATE` (YYYY-MM-DD)
pub fn get_min_last_open_time() -> Result<Option<DateTime<Utc>>> {
    match std::env::var("KLINES_MIN_LAST_DATE") {
        Ok(value) if !value.trim().is_empty() => parse_cutoff_date(&value).map(Some),
        _ => Ok(None),
    }
}
