use chrono::DateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a series was refused by the usability gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectReason {
    /// No rows at all
    Empty,
    /// Latest kline is older than the staleness cut-off
    Stale { last_open_time: i64, cutoff: i64 },
    /// Some consecutive pair is at least `limit_ms` apart
    ExcessiveGap { max_gap_ms: i64, limit_ms: i64 },
}

fn fmt_millis(ms: i64) -> String {
    DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| ms.to_string())
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::Empty => write!(f, "series is empty"),
            RejectReason::Stale { last_open_time, cutoff } => write!(
                f,
                "stale data: last kline {} is before cut-off {}",
                fmt_millis(*last_open_time),
                fmt_millis(*cutoff)
            ),
            RejectReason::ExcessiveGap { max_gap_ms, limit_ms } => write!(
                f,
                "excessive gap: {} min between klines (limit {} min)",
                max_gap_ms / 60_000,
                limit_ms / 60_000
            ),
        }
    }
}

/// Outcome of the usability gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    Accepted,
    Rejected(RejectReason),
}

impl Validity {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Validity::Accepted)
    }
}

/// Spacing score of a series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    /// Number of rows scored
    pub rows: usize,
    /// Consecutive pairs whose delta is not exactly one step
    pub wrong_steps: usize,
    /// `1 - wrong_steps / rows`, 1.0 for an empty series
    pub quality: f64,
}

impl QualityReport {
    pub fn new(rows: usize, wrong_steps: usize) -> Self {
        let quality = if rows == 0 {
            1.0
        } else {
            1.0 - wrong_steps as f64 / rows as f64
        };
        Self {
            rows,
            wrong_steps,
            quality,
        }
    }

    /// True if every consecutive pair is exactly one step apart
    pub fn is_perfect(&self) -> bool {
        self.wrong_steps == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_report() {
        let report = QualityReport::new(10, 1);
        assert!((report.quality - 0.9).abs() < 1e-12);
        assert!(!report.is_perfect());

        let empty = QualityReport::new(0, 0);
        assert_eq!(empty.quality, 1.0);
        assert!(empty.is_perfect());
    }

    #[test]
    fn test_reject_reason_display() {
        let gap = RejectReason::ExcessiveGap {
            max_gap_ms: 2 * 86_400_000,
            limit_ms: 86_400_000,
        };
        assert_eq!(gap.to_string(), "excessive gap: 2880 min between klines (limit 1440 min)");

        let stale = RejectReason::Stale {
            last_open_time: 0,
            cutoff: 60_000,
        };
        assert!(stale.to_string().starts_with("stale data: last kline 1970-01-01T00:00:00"));
    }

    #[test]
    fn test_reject_reason_json() {
        let json = serde_json::to_string(&RejectReason::Empty).unwrap();
        assert_eq!(json, r#"{"reason":"empty"}"#);
    }
}
