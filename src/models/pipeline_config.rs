use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::path::PathBuf;

use crate::constants::{
    DEFAULT_READ_DIR, DEFAULT_WRITE_DIR, INTERP_CHUNK_SIZE, MAX_TIME_GAP_MS, REFERENCE_DATE,
    STALENESS_DAYS, STEP_MS,
};
use crate::error::{AppError, Result};

/// Staleness cut-off derived from the reference date: series ending before
/// this instant are rejected
pub fn default_min_last_open_time() -> DateTime<Utc> {
    let (year, month, day) = REFERENCE_DATE;
    let reference = NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or_default();
    reference - Duration::days(STALENESS_DAYS)
}

/// Parse a `YYYY-MM-DD` cut-off date as midnight UTC
pub fn parse_cutoff_date(s: &str) -> Result<DateTime<Utc>> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| AppError::Config(format!("Invalid cut-off date: {}. Expected YYYY-MM-DD", s)))
}

/// Configuration for one interpolation run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory scanned for raw kline files
    pub read_dir: PathBuf,

    /// Directory processed files are written to
    pub write_dir: PathBuf,

    /// Grid step in milliseconds
    pub step_ms: i64,

    /// Gap-fill batch size; `None` builds the filled series in one buffer
    pub chunk_size: Option<usize>,

    /// Largest tolerated gap between consecutive klines (exclusive)
    pub max_time_gap_ms: i64,

    /// Series whose latest kline is before this instant are rejected
    pub min_last_open_time: DateTime<Utc>,

    /// Number of worker threads for the batch driver
    pub workers: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            read_dir: PathBuf::from(DEFAULT_READ_DIR),
            write_dir: PathBuf::from(DEFAULT_WRITE_DIR),
            step_ms: STEP_MS,
            chunk_size: Some(INTERP_CHUNK_SIZE),
            max_time_gap_ms: MAX_TIME_GAP_MS,
            min_last_open_time: default_min_last_open_time(),
            workers: default_workers(),
        }
    }
}

impl PipelineConfig {
    /// Create new config with custom directories, other values default
    pub fn new(read_dir: PathBuf, write_dir: PathBuf) -> Self {
        Self {
            read_dir,
            write_dir,
            ..Self::default()
        }
    }

    /// Minimum acceptable latest open time in milliseconds
    pub fn min_last_open_time_ms(&self) -> i64 {
        self.min_last_open_time.timestamp_millis()
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.step_ms <= 0 {
            return Err(AppError::Config(format!("step must be positive, got {}", self.step_ms)));
        }
        if self.chunk_size == Some(0) {
            return Err(AppError::Config("chunk size must be at least 1".to_string()));
        }
        if self.max_time_gap_ms <= 0 {
            return Err(AppError::Config(format!(
                "max time gap must be positive, got {}",
                self.max_time_gap_ms
            )));
        }
        if self.workers == 0 {
            return Err(AppError::Config("at least one worker is required".to_string()));
        }
        Ok(())
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
