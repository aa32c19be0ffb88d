//! Post-Interpolation Normalization
//!
//! Drops rows that do not sit on the minute grid and re-checks that the
//! remaining series is strictly increasing with no interior sentinel left.
//!
//! Dropping an off-grid row can leave a one-row hole in the series. The hole
//! is kept as is; gap filling is not re-run.

use tracing::debug;

use crate::error::{AppError, Result};
use crate::models::{KlineRow, Timestamped};
use crate::services::interpolator::find_interior_missing;

/// True if `open_time` is an exact multiple of `step_ms`
pub fn is_on_grid(open_time: i64, step_ms: i64) -> bool {
    open_time.rem_euclid(step_ms) == 0
}

/// Keep only rows whose open time is on the grid
pub fn normalize(mut rows: Vec<KlineRow>, step_ms: i64) -> Vec<KlineRow> {
    let before = rows.len();
    rows.retain(|row| is_on_grid(row.open_time, step_ms));

    let dropped = before - rows.len();
    if dropped > 0 {
        debug!(dropped, remaining = rows.len(), "Dropped off-grid klines");
    }
    rows
}

/// Fail on the first open time that does not strictly exceed its predecessor
///
/// Covers both duplicates and out-of-order rows.
pub fn ensure_strictly_increasing<T: Timestamped>(rows: &[T]) -> Result<()> {
    for (i, pair) in rows.windows(2).enumerate() {
        let previous = pair[0].open_time();
        let open_time = pair[1].open_time();
        if open_time <= previous {
            return Err(AppError::OrderingViolation {
                index: i + 1,
                previous,
                open_time,
            });
        }
    }
    Ok(())
}

/// Integrity check run on a finished series: strictly increasing open times
/// and no sentinel bracketed by known values
pub fn assert_integrity(rows: &[KlineRow]) -> Result<()> {
    ensure_strictly_increasing(rows)?;

    if let Some((index, column)) = find_interior_missing(rows) {
        return Err(AppError::Integrity(format!(
            "missing {} at row {} (open_time {})",
            column, index, rows[index].open_time
        )));
    }
    Ok(())
}
