use thiserror::Error;

use crate::types::TimestampMS;

/// Failures of the series engine
///
/// Empty input is never an error: aggregating zero snapshots yields an empty
/// series.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SeriesError {
    #[error("Invalid timeframe: {0} (expected one of 15m, 1h, 4h, 1d, 1w, 1M)")]
    InvalidTimeframe(String),

    #[error("Invalid metric: {0} (expected one of total, circulating, fdv, marketCap, liquidity)")]
    InvalidMetric(String),

    #[error("Snapshots not sorted by timestamp: entry {index} is older than its predecessor")]
    NonMonotonicInput { index: usize },

    #[error("Invalid snapshot at {timestamp}: {reason}")]
    InvalidSnapshot {
        timestamp: TimestampMS,
        reason: String,
    },

    #[error("Tick budget must be between 1 and {max}, got {requested}")]
    InvalidTickBudget { requested: usize, max: usize },

    #[error("Invalid month mode: {0} (expected fixed_stride or calendar)")]
    InvalidMonthMode(String),

    #[error("Gap fill step must be positive, got {0}ms")]
    InvalidStep(i64),

    #[error("Timestamp out of range: {0}")]
    TimestampOutOfRange(TimestampMS),
}
