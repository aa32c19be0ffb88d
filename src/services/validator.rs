//! Series Validation
//!
//! Two independent checks over any timestamped series:
//!
//! - **Quality**: share of rows that follow their predecessor by exactly one
//!   step. A diagnostic score, never a gate.
//! - **Usability gate**: rejects a series whose latest kline is older than
//!   the staleness cut-off, or that has a gap between consecutive klines of
//!   the maximum tolerated size or more. Rejected series are skipped rather
//!   than interpolated.

use crate::models::{PipelineConfig, QualityReport, RejectReason, Timestamped, Validity};

/// Score a series: `1 - (pairs not exactly one step apart) / rows`
pub fn quality<T: Timestamped>(rows: &[T], step_ms: i64) -> QualityReport {
    let wrong_steps = rows
        .windows(2)
        .filter(|w| w[1].open_time().saturating_sub(w[0].open_time()) != step_ms)
        .count();
    QualityReport::new(rows.len(), wrong_steps)
}

/// Largest difference between consecutive open times, `None` with fewer
/// than two rows. Spans beyond `i64` saturate at `i64::MAX`.
pub fn max_time_gap<T: Timestamped>(rows: &[T]) -> Option<i64> {
    rows.windows(2)
        .map(|w| w[1].open_time().saturating_sub(w[0].open_time()))
        .max()
}

/// Latest open time in the series
pub fn last_open_time<T: Timestamped>(rows: &[T]) -> Option<i64> {
    rows.iter().map(|r| r.open_time()).max()
}

/// Thresholds of the usability gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsabilityGate {
    /// Gaps of this many milliseconds or more are rejected
    pub max_time_gap_ms: i64,
    /// Series whose latest open time is before this are rejected
    pub min_last_open_time_ms: i64,
}

impl UsabilityGate {
    pub fn new(max_time_gap_ms: i64, min_last_open_time_ms: i64) -> Self {
        Self {
            max_time_gap_ms,
            min_last_open_time_ms,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.max_time_gap_ms, config.min_last_open_time_ms())
    }

    pub fn is_outdated<T: Timestamped>(&self, rows: &[T]) -> bool {
        match last_open_time(rows) {
            Some(last) => last < self.min_last_open_time_ms,
            None => true,
        }
    }

    pub fn are_time_gaps_ok<T: Timestamped>(&self, rows: &[T]) -> bool {
        match max_time_gap(rows) {
            Some(gap) => gap < self.max_time_gap_ms,
            None => true,
        }
    }

    /// Staleness is checked before gaps, so a stale series is reported as
    /// stale whatever its spacing
    pub fn check<T: Timestamped>(&self, rows: &[T]) -> Validity {
        let Some(last) = last_open_time(rows) else {
            return Validity::Rejected(RejectReason::Empty);
        };

        if self.is_outdated(rows) {
            return Validity::Rejected(RejectReason::Stale {
                last_open_time: last,
                cutoff: self.min_last_open_time_ms,
            });
        }

        if !self.are_time_gaps_ok(rows) {
            return Validity::Rejected(RejectReason::ExcessiveGap {
                max_gap_ms: max_time_gap(rows).unwrap_or(i64::MAX),
                limit_ms: self.max_time_gap_ms,
            });
        }

        Validity::Accepted
    }
}

/// Run the usability gate with thresholds from `config`
pub fn validate<T: Timestamped>(rows: &[T], config: &PipelineConfig) -> Validity {
    UsabilityGate::from_config(config).check(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{default_min_last_open_time, KlineRow};

    const STEP: i64 = 60_000;
    const DAY: i64 = 86_400_000;

    fn rows_at(times: &[i64]) -> Vec<KlineRow> {
        times.iter().map(|t| KlineRow::blank(*t)).collect()
    }

    fn recent_start() -> i64 {
        // 2022-08-01T00:00:00Z, after the default cut-off
        1_659_312_000_000
    }

    #[test]
    fn test_quality_one_missing_step_in_ten_rows() {
        let t0 = recent_start();
        let mut times: Vec<i64> = (0..10).map(|i| t0 + i * STEP).collect();
        // shift the tail by one step: minute 5 is missing
        for t in times.iter_mut().skip(5) {
            *t += STEP;
        }
        let report = quality(&rows_at(&times), STEP);
        assert_eq!(report.rows, 10);
        assert_eq!(report.wrong_steps, 1);
        assert!((report.quality - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_quality_perfect_series() {
        let t0 = recent_start();
        let times: Vec<i64> = (0..100).map(|i| t0 + i * STEP).collect();
        let report = quality(&rows_at(&times), STEP);
        assert_eq!(report.quality, 1.0);
        assert!(report.is_perfect());
    }

    #[test]
    fn test_quality_counts_short_steps() {
        let report = quality(&rows_at(&[0, STEP, STEP + 30_000, 2 * STEP]), STEP);
        assert_eq!(report.wrong_steps, 2);
        assert!((report.quality - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_max_time_gap() {
        assert_eq!(max_time_gap::<KlineRow>(&[]), None);
        assert_eq!(max_time_gap(&rows_at(&[0])), None);
        assert_eq!(max_time_gap(&rows_at(&[0, STEP, 10 * STEP, 11 * STEP])), Some(9 * STEP));
    }

    #[test]
    fn test_stale_series_rejected_regardless_of_quality() {
        let cutoff = default_min_last_open_time().timestamp_millis();
        let end = cutoff - DAY;
        let times: Vec<i64> = (0..60).map(|i| end - (59 - i) * STEP).collect();
        let rows = rows_at(&times);

        assert!(quality(&rows, STEP).is_perfect());
        let validity = validate(&rows, &PipelineConfig::default());
        assert_eq!(
            validity,
            Validity::Rejected(RejectReason::Stale {
                last_open_time: end,
                cutoff,
            })
        );
    }

    #[test]
    fn test_gap_of_one_day_rejected() {
        let t0 = recent_start();
        let gate = UsabilityGate::new(DAY, 0);

        let ok = rows_at(&[t0, t0 + DAY - STEP]);
        assert!(gate.are_time_gaps_ok(&ok));
        assert_eq!(gate.check(&ok), Validity::Accepted);

        let bad = rows_at(&[t0, t0 + STEP, t0 + STEP + DAY]);
        assert!(!gate.are_time_gaps_ok(&bad));
        assert_eq!(
            gate.check(&bad),
            Validity::Rejected(RejectReason::ExcessiveGap {
                max_gap_ms: DAY,
                limit_ms: DAY,
            })
        );
    }

    #[test]
    fn test_empty_and_single_row() {
        let gate = UsabilityGate::new(DAY, 0);
        assert_eq!(gate.check::<KlineRow>(&[]), Validity::Rejected(RejectReason::Empty));
        assert!(gate.is_outdated::<KlineRow>(&[]));

        let single = rows_at(&[recent_start()]);
        assert!(gate.check(&single).is_accepted());
    }

    #[test]
    fn test_extreme_span_saturates_and_is_rejected() {
        let t0 = recent_start();
        let rows = rows_at(&[i64::MIN, t0]);

        assert_eq!(max_time_gap(&rows), Some(i64::MAX));
        assert_eq!(quality(&rows, STEP).wrong_steps, 1);
        assert_eq!(
            validate(&rows, &PipelineConfig::default()),
            Validity::Rejected(RejectReason::ExcessiveGap {
                max_gap_ms: i64::MAX,
                limit_ms: DAY,
            })
        );
    }

    #[test]
    fn test_recent_contiguous_series_accepted() {
        let t0 = recent_start();
        let times: Vec<i64> = (0..10).map(|i| t0 + i * STEP).collect();
        assert!(validate(&rows_at(&times), &PipelineConfig::default()).is_accepted());
    }
}
