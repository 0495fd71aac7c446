pub mod metric;
pub mod ohlc;
pub mod raw_reading;
pub mod timeframe;
pub mod token_snapshot;

// Re-export common types
pub use metric::Metric;
pub use ohlc::OhlcRecord;
pub use raw_reading::{RawAmount, RawTokenReading, BASE_UNITS_PER_TOKEN};
pub use timeframe::Timeframe;
pub use token_snapshot::TokenSnapshot;

use chrono::{DateTime, SecondsFormat, Utc};

/// Timestamp in milliseconds since Unix epoch (UTC)
pub type TimestampMS = i64;

/// Render a millisecond timestamp as an RFC3339 UTC string
///
/// Returns None when the instant is outside chrono's representable range.
pub fn timestamp_to_rfc3339(timestamp: TimestampMS) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(timestamp)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}
