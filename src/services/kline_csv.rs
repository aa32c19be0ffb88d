//! Kline CSV Storage
//!
//! Reads kline files in the processing layout and writes them back in the
//! post-processed layout. Headers are matched by name, so column order is free
//! and extra columns (e.g. `close_time`, `ignore`) are ignored.
//!
//! `open_time` is read as integer milliseconds, an RFC 3339 timestamp or a
//! `YYYY-MM-DD HH:MM:SS[.fff]` UTC timestamp, and always written as integer
//! milliseconds. Missing numeric values are empty cells.

use chrono::{DateTime, NaiveDateTime};
use csv::{Reader, StringRecord, Writer};
use std::collections::HashMap;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::constants::{kline_column, KLINE_FILE_EXTENSION};
use crate::error::{AppError, Result};
use crate::models::{Kline, KlineFormat, KlineRow, KlineValues, NumericColumn};

/// Result of loading a kline file
#[derive(Debug)]
pub enum LoadedKlines {
    /// Processing layout, ready for the pipeline
    Raw(Vec<Kline>),
    /// File already has an `interpolated` column
    AlreadyProcessed,
}

/// Header name to column position
struct ColumnIndex {
    positions: HashMap<String, usize>,
}

impl ColumnIndex {
    fn new(headers: &StringRecord) -> Self {
        let positions = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_string(), i))
            .collect();
        Self { positions }
    }

    fn position(&self, column: &str) -> Result<usize> {
        self.positions
            .get(column)
            .copied()
            .ok_or_else(|| AppError::Schema(format!("missing column: {}", column)))
    }

    fn field<'r>(&self, record: &'r StringRecord, column: &str, row: usize) -> Result<&'r str> {
        let position = self.position(column)?;
        record.get(position).map(str::trim).ok_or_else(|| {
            AppError::Schema(format!("row {}: no value for column {}", row, column))
        })
    }
}

/// Parse an open time cell into milliseconds since the epoch
pub fn parse_open_time(cell: &str) -> Option<i64> {
    let cell = cell.trim();
    if let Ok(ms) = cell.parse::<i64>() {
        return Some(ms);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(cell) {
        return Some(dt.timestamp_millis());
    }
    NaiveDateTime::parse_from_str(cell, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|dt| dt.and_utc().timestamp_millis())
}

/// Parse a numeric cell; empty and NaN cells become the missing sentinel
pub fn parse_numeric(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() || cell.eq_ignore_ascii_case("nan") {
        return Some(f64::NAN);
    }
    cell.parse::<f64>().ok()
}

fn parse_flag(cell: &str) -> Option<bool> {
    match cell.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

fn format_numeric(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}

fn parse_values(index: &ColumnIndex, record: &StringRecord, row: usize) -> Result<KlineValues> {
    let mut values = KlineValues::missing();
    for column in NumericColumn::ALL {
        let cell = index.field(record, column.name(), row)?;
        let value = parse_numeric(cell).ok_or_else(|| {
            AppError::Schema(format!("row {}: {} is not a number: {:?}", row, column, cell))
        })?;
        values.set(column, value);
    }
    Ok(values)
}

fn parse_open_time_field(index: &ColumnIndex, record: &StringRecord, row: usize) -> Result<i64> {
    let cell = index.field(record, kline_column::OPEN_TIME, row)?;
    parse_open_time(cell).ok_or_else(|| {
        AppError::Schema(format!("row {}: open_time is not a timestamp: {:?}", row, cell))
    })
}

/// Read klines in the processing layout from any reader
pub fn read_klines_from<R: Read>(reader: R) -> Result<LoadedKlines> {
    let mut reader = Reader::from_reader(reader);
    let headers = reader.headers()?.clone();

    if KlineFormat::detect(headers.iter()) == KlineFormat::PostProcessed {
        return Ok(LoadedKlines::AlreadyProcessed);
    }
    KlineFormat::Processing.check_headers(headers.iter())?;

    let index = ColumnIndex::new(&headers);
    let mut klines = Vec::new();

    for (i, result) in reader.records().enumerate() {
        let record = result?;
        // 1-based data row, header excluded
        let row = i + 1;
        let open_time = parse_open_time_field(&index, &record, row)?;
        let values = parse_values(&index, &record, row)?;
        klines.push(Kline::new(open_time, values));
    }

    Ok(LoadedKlines::Raw(klines))
}

/// Read a kline file in the processing layout
pub fn read_klines(path: &Path) -> Result<LoadedKlines> {
    let file = std::fs::File::open(path)
        .map_err(|e| AppError::Io(format!("Failed to open {}: {}", path.display(), e)))?;
    read_klines_from(file)
}

/// Read post-processed rows from any reader
pub fn read_processed_from<R: Read>(reader: R) -> Result<Vec<KlineRow>> {
    let mut reader = Reader::from_reader(reader);
    let headers = reader.headers()?.clone();
    KlineFormat::PostProcessed.check_headers(headers.iter())?;

    let index = ColumnIndex::new(&headers);
    let mut rows = Vec::new();

    for (i, result) in reader.records().enumerate() {
        let record = result?;
        let row = i + 1;
        let open_time = parse_open_time_field(&index, &record, row)?;
        let values = parse_values(&index, &record, row)?;
        let cell = index.field(&record, kline_column::INTERPOLATED, row)?;
        let interpolated = parse_flag(cell).ok_or_else(|| {
            AppError::Schema(format!("row {}: interpolated is not a boolean: {:?}", row, cell))
        })?;
        rows.push(KlineRow {
            open_time,
            values,
            interpolated,
        });
    }

    Ok(rows)
}

/// Read a post-processed kline file
pub fn read_processed(path: &Path) -> Result<Vec<KlineRow>> {
    let file = std::fs::File::open(path)
        .map_err(|e| AppError::Io(format!("Failed to open {}: {}", path.display(), e)))?;
    read_processed_from(file)
}

/// Write rows in the post-processed layout to any writer
pub fn write_processed_to<W: Write>(rows: &[KlineRow], writer: W) -> Result<()> {
    let mut writer = Writer::from_writer(writer);
    writer.write_record(KlineFormat::PostProcessed.columns())?;

    for row in rows {
        let mut record = Vec::with_capacity(KlineFormat::PostProcessed.columns().len());
        record.push(row.open_time.to_string());
        for column in NumericColumn::ALL {
            record.push(format_numeric(row.values.get(column)));
        }
        record.push(row.interpolated.to_string());
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

/// Write a post-processed kline file, creating parent directories
///
/// Rows go to a temporary file next to `path` that is renamed over it once
/// complete, so an interrupted write never leaves a partial file at `path`.
pub fn write_processed(rows: &[KlineRow], path: &Path) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)
        .map_err(|e| AppError::Io(format!("Failed to create {}: {}", dir.display(), e)))?;

    let mut tmp = NamedTempFile::new_in(dir)
        .map_err(|e| AppError::Io(format!("Failed to create temp file in {}: {}", dir.display(), e)))?;
    write_processed_to(rows, BufWriter::new(tmp.as_file_mut()))?;
    tmp.persist(path)
        .map_err(|e| AppError::Io(format!("Failed to write {}: {}", path.display(), e.error)))?;
    Ok(())
}

/// Kline files in `dir`, sorted by name
pub fn list_kline_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| AppError::Io(format!("Failed to read {}: {}", dir.display(), e)))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| AppError::Io(format!("Failed to read entry: {}", e)))?;
        let path = entry.path();
        let is_kline_file = path.is_file()
            && path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(KLINE_FILE_EXTENSION));
        if is_kline_file {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// Asset pair name of a kline file (`ADA-BTC.csv` -> `ADA-BTC`)
pub fn pair_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "open_time,open,high,low,close,volume,quote_asset_volume,number_of_trades,taker_buy_base_asset_volume,taker_buy_quote_asset_volume";

    fn raw(loaded: LoadedKlines) -> Vec<Kline> {
        match loaded {
            LoadedKlines::Raw(klines) => klines,
            LoadedKlines::AlreadyProcessed => panic!("expected raw klines"),
        }
    }

    #[test]
    fn test_parse_open_time_formats() {
        assert_eq!(parse_open_time("1577836800000"), Some(1_577_836_800_000));
        assert_eq!(parse_open_time("2020-01-01T00:01:00Z"), Some(1_577_836_860_000));
        assert_eq!(parse_open_time("2020-01-01 00:02:00"), Some(1_577_836_920_000));
        assert_eq!(parse_open_time("2020-01-01 00:02:00.500"), Some(1_577_836_920_500));
        assert_eq!(parse_open_time("yesterday"), None);
    }

    #[test]
    fn test_parse_numeric() {
        assert_eq!(parse_numeric("1.5"), Some(1.5));
        assert_eq!(parse_numeric(" 42 "), Some(42.0));
        assert!(parse_numeric("").unwrap().is_nan());
        assert!(parse_numeric("NaN").unwrap().is_nan());
        assert_eq!(parse_numeric("abc"), None);
    }

    #[test]
    fn test_read_processing_layout() {
        let data = format!(
            "{}\n1577836800000,1,2,0.5,1.5,10,15,3,4,6\n1577836860000,1.5,2,1,1.8,,20,4,5,8\n",
            HEADER
        );
        let klines = raw(read_klines_from(data.as_bytes()).unwrap());

        assert_eq!(klines.len(), 2);
        assert_eq!(klines[0].open_time, 1_577_836_800_000);
        assert_eq!(klines[0].values.close, 1.5);
        assert_eq!(klines[0].values.number_of_trades, 3.0);
        assert!(klines[1].values.volume.is_nan());
    }

    #[test]
    fn test_read_ignores_extra_columns_and_order() {
        let data = "close,ignore,open_time,open,high,low,volume,quote_asset_volume,number_of_trades,taker_buy_base_asset_volume,taker_buy_quote_asset_volume\n\
                    7,x,60000,1,2,3,4,5,6,7,8\n";
        let klines = raw(read_klines_from(data.as_bytes()).unwrap());
        assert_eq!(klines[0].open_time, 60_000);
        assert_eq!(klines[0].values.close, 7.0);
        assert_eq!(klines[0].values.taker_buy_quote_asset_volume, 8.0);
    }

    #[test]
    fn test_missing_column_is_schema_error() {
        let data = "open_time,open,high,low,close\n0,1,1,1,1\n";
        let err = read_klines_from(data.as_bytes()).unwrap_err();
        assert!(matches!(err, AppError::Schema(_)));
    }

    #[test]
    fn test_bad_value_is_schema_error() {
        let data = format!("{}\n0,1,2,3,oops,5,6,7,8,9\n", HEADER);
        let err = read_klines_from(data.as_bytes()).unwrap_err();
        match err {
            AppError::Schema(msg) => assert!(msg.contains("close"), "{}", msg),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_processed_file_is_detected() {
        let data = format!("{},interpolated\n0,1,2,3,4,5,6,7,8,9,false\n", HEADER);
        assert!(matches!(
            read_klines_from(data.as_bytes()).unwrap(),
            LoadedKlines::AlreadyProcessed
        ));
    }

    #[test]
    fn test_processed_round_trip() {
        let mut values = KlineValues::missing();
        values.open = 0.1;
        values.close = 1234.5678;
        values.number_of_trades = 7.5;
        let rows = vec![
            KlineRow {
                open_time: 60_000,
                values,
                interpolated: false,
            },
            KlineRow::blank(120_000),
        ];

        let mut buf = Vec::new();
        write_processed_to(&rows, &mut buf).unwrap();
        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.starts_with("open_time,open,"));
        assert!(text.contains("120000,,,,,,,,,,true"));

        let back = read_processed_from(buf.as_slice()).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back[0].open_time, 60_000);
        assert_eq!(back[0].values.open, 0.1);
        assert_eq!(back[0].values.close, 1234.5678);
        assert_eq!(back[0].values.number_of_trades, 7.5);
        assert!(back[0].values.high.is_nan());
        assert!(!back[0].interpolated);
        assert!(back[1].interpolated);
        assert!(back[1].values.has_missing());
    }

    #[test]
    fn test_list_kline_files_and_pair_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("BTC-USDT.csv"), HEADER).unwrap();
        std::fs::write(dir.path().join("ADA-BTC.csv"), HEADER).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();
        std::fs::create_dir(dir.path().join("nested.csv")).unwrap();

        let files = list_kline_files(dir.path()).unwrap();
        let names: Vec<String> = files.iter().map(|p| pair_name(p)).collect();
        assert_eq!(names, vec!["ADA-BTC", "BTC-USDT"]);
    }

    #[test]
    fn test_write_processed_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("ADA-BTC.csv");
        write_processed(&[KlineRow::blank(0)], &path).unwrap();
        assert_eq!(read_processed(&path).unwrap().len(), 1);
    }
    #[test]
    fn test_write_processed_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ADA-BTC.csv");
        std::fs::write(&path, "stale contents").unwrap();

        write_processed(&[KlineRow::blank(0), KlineRow::blank(60_000)], &path).unwrap();

        assert_eq!(read_processed(&path).unwrap().len(), 2);
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_failed_write_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        // a directory cannot be replaced by the finished file
        let path = dir.path().join("ADA-BTC.csv");
        std::fs::create_dir(&path).unwrap();

        let err = write_processed(&[KlineRow::blank(0)], &path).unwrap_err();
        assert!(matches!(err, AppError::Io(_)));

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("ADA-BTC.csv")]);
        assert!(path.is_dir());
    }
}
