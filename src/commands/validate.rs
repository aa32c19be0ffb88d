//! Validate Command
//!
//! Scores every processed file in a directory and reports the lowest quality.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::constants::STEP_MS;
use crate::error::Error;
use crate::services::{interpolator, kline_csv, validator};
use crate::utils::get_write_dir;

/// Quality of one processed file
#[derive(Debug, Clone, Serialize)]
pub struct FileQuality {
    pub pair: String,
    pub rows: usize,
    pub interpolated_rows: usize,
    pub unfilled_values: usize,
    pub quality: f64,
}

/// Quality over a processed directory
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub files: Vec<FileQuality>,
    pub errors: Vec<String>,
    pub min_quality: Option<f64>,
}

impl ValidationReport {
    pub fn print_summary(&self) {
        println!("\n📊 Validation Summary:");
        for file in &self.files {
            println!(
                "  {:<16} {:>9} rows  {:>7} interpolated  quality {:.4}",
                file.pair, file.rows, file.interpolated_rows, file.quality
            );
            if file.unfilled_values > 0 {
                println!("    ⚠️  {} unfilled values at the edges", file.unfilled_values);
            }
        }

        match self.min_quality {
            Some(min) => println!("  ✅ Minimum quality: {:.4}", min),
            None => println!("  ⚠️  No processed files scored"),
        }

        if !self.errors.is_empty() {
            println!("  ❌ Unreadable files: {}", self.errors.len());
            for error in &self.errors {
                println!("    {}", error);
            }
        }
    }
}

fn score_file(path: &Path) -> Result<FileQuality, Error> {
    let rows = kline_csv::read_processed(path)?;
    let report = validator::quality(&rows, STEP_MS);
    Ok(FileQuality {
        pair: kline_csv::pair_name(path),
        rows: report.rows,
        interpolated_rows: rows.iter().filter(|r| r.interpolated).count(),
        unfilled_values: interpolator::count_missing(&rows),
        quality: report.quality,
    })
}

/// Score every `*.csv` under `dir`
pub fn validate_dir(dir: &Path) -> Result<ValidationReport, Error> {
    if !dir.is_dir() {
        return Err(Error::Io(format!("Processed directory not found: {}", dir.display())));
    }

    let mut report = ValidationReport::default();
    for path in kline_csv::list_kline_files(dir)? {
        match score_file(&path) {
            Ok(file) => {
                info!(pair = %file.pair, rows = file.rows, quality = file.quality, "Scored");
                report.files.push(file);
            }
            Err(e) => {
                warn!(file = %path.display(), error = %e, "Failed to score");
                report.errors.push(format!("{}: {}", path.display(), e));
            }
        }
    }

    report.min_quality = report.files.iter().map(|f| f.quality).reduce(f64::min);
    Ok(report)
}

/// Run the validate command
pub fn run(dir: Option<PathBuf>, json: bool) -> Result<(), Error> {
    let dir = dir.unwrap_or_else(get_write_dir);
    let report = validate_dir(&dir)?;

    if json {
        let out = serde_json::to_string_pretty(&report)
            .map_err(|e| Error::Other(format!("Failed to serialize report: {}", e)))?;
        println!("{}", out);
    } else {
        report.print_summary();
    }
    Ok(())
}
