//! Linear Interpolation
//!
//! Fills runs of the missing sentinel in each numeric column by linear
//! interpolation between the nearest known values on either side. Only
//! interior runs are filled: a run at the start or end of the series has no
//! bracketing value on one side and stays missing.

use crate::models::{KlineRow, NumericColumn};

/// Fill every interior sentinel run in every numeric column
///
/// The `interpolated` flag is left untouched; it was set when the row was
/// created.
pub fn interpolate(mut rows: Vec<KlineRow>) -> Vec<KlineRow> {
    for column in NumericColumn::ALL {
        interpolate_column(&mut rows, column);
    }
    rows
}

/// Fill interior sentinel runs in one column, returning the number of values
/// written
///
/// A run of `m` missing values between `v0` at `p0` and `v1` at `p0 + m + 1`
/// gets `v0 + (v1 - v0) * j / (m + 1)` at `p0 + j`.
pub fn interpolate_column(rows: &mut [KlineRow], column: NumericColumn) -> usize {
    let mut filled = 0;
    let mut last_known: Option<usize> = None;

    for i in 0..rows.len() {
        if rows[i].values.is_missing(column) {
            continue;
        }

        if let Some(p0) = last_known {
            let run = i - p0 - 1;
            if run > 0 {
                let v0 = rows[p0].values.get(column);
                let v1 = rows[i].values.get(column);
                fill_run(&mut rows[p0 + 1..i], column, v0, v1);
                filled += run;
            }
        }
        last_known = Some(i);
    }

    filled
}

fn fill_run(run: &mut [KlineRow], column: NumericColumn, v0: f64, v1: f64) {
    let steps = (run.len() + 1) as f64;
    let (lo, hi) = if v0 <= v1 { (v0, v1) } else { (v1, v0) };

    for (j, row) in run.iter_mut().enumerate() {
        // rounding can overshoot a bound by an ulp
        let value = (v0 + (v1 - v0) * (j + 1) as f64 / steps).clamp(lo, hi);
        row.values.set(column, value);
    }
}

/// Number of sentinel values left across all columns
pub fn count_missing(rows: &[KlineRow]) -> usize {
    rows.iter()
        .map(|row| {
            NumericColumn::ALL
                .iter()
                .filter(|c| row.values.is_missing(**c))
                .count()
        })
        .sum()
}

/// Index of the first row holding a sentinel that has known values on both
/// sides in the same column, if any
pub fn find_interior_missing(rows: &[KlineRow]) -> Option<(usize, NumericColumn)> {
    for column in NumericColumn::ALL {
        let first_known = rows.iter().position(|r| !r.values.is_missing(column));
        let last_known = rows.iter().rposition(|r| !r.values.is_missing(column));

        if let (Some(first), Some(last)) = (first_known, last_known) {
            if let Some(offset) = rows[first..=last]
                .iter()
                .position(|r| r.values.is_missing(column))
            {
                return Some((first + offset, column));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::KlineValues;

    const STEP: i64 = 60_000;

    fn row(i: i64, price: Option<f64>) -> KlineRow {
        match price {
            Some(p) => KlineRow {
                open_time: i * STEP,
                values: KlineValues {
                    open: p,
                    high: p * 2.0,
                    low: p / 2.0,
                    close: p,
                    volume: 100.0,
                    quote_asset_volume: 50.0,
                    number_of_trades: 7.0,
                    taker_buy_base_asset_volume: 3.0,
                    taker_buy_quote_asset_volume: 1.0,
                },
                interpolated: false,
            },
            None => KlineRow::blank(i * STEP),
        }
    }

    fn series(prices: &[Option<f64>]) -> Vec<KlineRow> {
        prices
            .iter()
            .enumerate()
            .map(|(i, p)| row(i as i64, *p))
            .collect()
    }

    fn close(rows: &[KlineRow]) -> Vec<f64> {
        rows.iter().map(|r| r.values.close).collect()
    }

    #[test]
    fn test_linear_fill_between_neighbours() {
        let rows = interpolate(series(&[Some(10.0), None, None, Some(40.0)]));
        assert_eq!(close(&rows), vec![10.0, 20.0, 30.0, 40.0]);
        assert_eq!(rows[1].values.high, 40.0);
        assert_eq!(rows[2].values.low, 15.0);
        // constant columns stay constant
        assert_eq!(rows[1].values.volume, 100.0);
        assert_eq!(rows[2].values.number_of_trades, 7.0);
    }

    #[test]
    fn test_number_of_trades_may_be_fractional() {
        let mut rows = series(&[Some(1.0), None, Some(1.0)]);
        rows[2].values.number_of_trades = 8.0;
        let rows = interpolate(rows);
        assert_eq!(rows[1].values.number_of_trades, 7.5);
    }

    #[test]
    fn test_leading_and_trailing_runs_are_not_extrapolated() {
        let rows = interpolate(series(&[None, None, Some(1.0), None, Some(3.0), None]));

        assert!(rows[0].values.close.is_nan());
        assert!(rows[1].values.close.is_nan());
        assert_eq!(rows[3].values.close, 2.0);
        assert!(rows[5].values.close.is_nan());
        assert_eq!(count_missing(&rows), 3 * NumericColumn::ALL.len());
        assert_eq!(find_interior_missing(&rows), None);
    }

    #[test]
    fn test_filled_values_stay_within_bounds() {
        let rows = interpolate(series(&[
            Some(5.0),
            None,
            None,
            None,
            None,
            None,
            None,
            Some(0.3),
            None,
            None,
            Some(1e9),
        ]));

        for i in 1..7 {
            let v = rows[i].values.close;
            assert!(v >= 0.3 && v <= 5.0, "row {} = {}", i, v);
        }
        for i in 8..10 {
            let v = rows[i].values.close;
            assert!(v >= 0.3 && v <= 1e9, "row {} = {}", i, v);
        }
        // decreasing run stays monotonic
        assert!(rows[1..7].windows(2).all(|w| w[0].values.close > w[1].values.close));
    }

    #[test]
    fn test_columns_are_filled_independently() {
        let mut rows = series(&[Some(0.0), Some(1.0), Some(2.0), Some(3.0)]);
        rows[1].values.volume = f64::NAN;
        rows[2].values.open = f64::NAN;
        rows[3].values.open = 9.0;

        let filled = interpolate_column(&mut rows, NumericColumn::Volume);
        assert_eq!(filled, 1);
        assert_eq!(rows[1].values.volume, 100.0);
        assert!(rows[2].values.open.is_nan());

        let filled = interpolate_column(&mut rows, NumericColumn::Open);
        assert_eq!(filled, 1);
        assert_eq!(rows[2].values.open, 5.0);
    }

    #[test]
    fn test_flags_are_untouched() {
        let rows = interpolate(series(&[Some(1.0), None, Some(3.0)]));
        let flags: Vec<bool> = rows.iter().map(|r| r.interpolated).collect();
        assert_eq!(flags, vec![false, true, false]);
    }

    #[test]
    fn test_gapless_series_is_noop() {
        let rows = series(&[Some(1.0), Some(2.0), Some(3.0)]);
        let out = interpolate(rows.clone());
        assert_eq!(out, rows);
    }

    #[test]
    fn test_find_interior_missing() {
        let mut rows = series(&[Some(1.0), Some(2.0), Some(3.0)]);
        rows[1].values.taker_buy_base_asset_volume = f64::NAN;
        assert_eq!(
            find_interior_missing(&rows),
            Some((1, NumericColumn::TakerBuyBaseAssetVolume))
        );
    }

    #[test]
    fn test_all_missing_column_stays_missing() {
        let rows = interpolate(series(&[None, None, None]));
        assert_eq!(count_missing(&rows), 3 * NumericColumn::ALL.len());
    }
}
