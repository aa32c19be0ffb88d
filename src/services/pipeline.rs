//! Interpolation Pipeline
//!
//! Runs one asset pair end to end:
//!
//! 1. preprocess (dedup by open time, sort ascending)
//! 2. usability gate (staleness, maximum gap); rejected series stop here
//! 3. gap fill, optionally in fixed-size batches
//! 4. linear interpolation, interior runs only
//! 5. drop off-grid rows and check integrity
//! 6. score quality of the result
//!
//! The series is owned and moved through each stage.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::models::{Kline, KlineRow, PipelineConfig, QualityReport, RejectReason, Validity};
use crate::services::gap_filler::GapFiller;
use crate::services::kline_csv::{self, LoadedKlines};
use crate::services::{interpolator, normalizer, preprocessing, validator};

/// Counters collected while processing one series
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PipelineStats {
    pub input_rows: usize,
    pub duplicates_removed: usize,
    /// Placeholder rows created by the gap filler
    pub synthesized_rows: usize,
    /// Rows removed for not being on the minute grid
    pub dropped_off_grid: usize,
    /// Sentinel values left in leading or trailing runs
    pub unfilled_values: usize,
    pub output_rows: usize,
    pub quality: QualityReport,
}

/// Result of running the pipeline over one series
#[derive(Debug, Clone)]
pub enum SeriesOutcome {
    Processed {
        rows: Vec<KlineRow>,
        stats: PipelineStats,
    },
    Rejected(RejectReason),
}

/// Run the full pipeline over one series of observed klines
pub fn process_series(klines: Vec<Kline>, config: &PipelineConfig) -> Result<SeriesOutcome> {
    let (klines, prep) = preprocessing::prepare(klines)?;

    if let Validity::Rejected(reason) = validator::validate(&klines, config) {
        return Ok(SeriesOutcome::Rejected(reason));
    }

    let filler = GapFiller::new(config.step_ms).with_chunk_size(config.chunk_size);
    let observed = klines.len();
    let filled = filler.fill(klines);
    let synthesized_rows = filled.len() - observed;
    debug!(observed, synthesized_rows, "Gap fill complete");

    let interpolated = interpolator::interpolate(filled);
    let before_normalize = interpolated.len();

    let rows = normalizer::normalize(interpolated, config.step_ms);
    normalizer::assert_integrity(&rows)?;

    let stats = PipelineStats {
        input_rows: prep.input_rows,
        duplicates_removed: prep.duplicates_removed,
        synthesized_rows,
        dropped_off_grid: before_normalize - rows.len(),
        unfilled_values: interpolator::count_missing(&rows),
        output_rows: rows.len(),
        quality: validator::quality(&rows, config.step_ms),
    };

    Ok(SeriesOutcome::Processed { rows, stats })
}

/// What happened to one kline file
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    /// Processed and written to `output`
    Written {
        pair: String,
        output: PathBuf,
        stats: PipelineStats,
    },
    /// Refused by the usability gate; nothing written
    Rejected { pair: String, reason: RejectReason },
    /// Already carries an `interpolated` column; nothing written
    AlreadyProcessed { pair: String },
}

impl FileOutcome {
    pub fn pair(&self) -> &str {
        match self {
            FileOutcome::Written { pair, .. }
            | FileOutcome::Rejected { pair, .. }
            | FileOutcome::AlreadyProcessed { pair } => pair,
        }
    }

    /// Quality of the written series, if one was written
    pub fn quality(&self) -> Option<f64> {
        match self {
            FileOutcome::Written { stats, .. } => Some(stats.quality.quality),
            _ => None,
        }
    }
}

/// Read one kline file, run the pipeline and write the result into
/// `config.write_dir` under the same file name
pub fn process_file(path: &Path, config: &PipelineConfig) -> Result<FileOutcome> {
    let pair = kline_csv::pair_name(path);

    let klines = match kline_csv::read_klines(path)? {
        LoadedKlines::Raw(klines) => klines,
        LoadedKlines::AlreadyProcessed => {
            info!(pair = %pair, "Already interpolated, skipping");
            return Ok(FileOutcome::AlreadyProcessed { pair });
        }
    };

    match process_series(klines, config)? {
        SeriesOutcome::Rejected(reason) => {
            warn!(pair = %pair, %reason, "Failed to validate, skipping");
            Ok(FileOutcome::Rejected { pair, reason })
        }
        SeriesOutcome::Processed { rows, stats } => {
            let file_name = path
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(format!("{}.csv", pair)));
            let output = config.write_dir.join(file_name);
            kline_csv::write_processed(&rows, &output)?;

            info!(
                pair = %pair,
                rows = stats.output_rows,
                synthesized = stats.synthesized_rows,
                dropped = stats.dropped_off_grid,
                quality = stats.quality.quality,
                "Interpolated"
            );
            Ok(FileOutcome::Written {
                pair,
                output,
                stats,
            })
        }
    }
}
