use crate::types::TimestampMS;
use serde::{Deserialize, Serialize};

/// One candlestick: the open/high/low/close summary of a single bucket
/// for a single metric. `date` is the bucket start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OhlcRecord {
    pub date: TimestampMS,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl OhlcRecord {
    /// A candle with all four prices equal, used for buckets without data
    pub fn flat(date: TimestampMS, value: f64) -> Self {
        Self {
            date,
            open: value,
            high: value,
            low: value,
            close: value,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.open == self.high && self.high == self.low && self.low == self.close
    }

    /// `low <= open, close <= high`
    pub fn is_consistent(&self) -> bool {
        self.low <= self.open
            && self.open <= self.high
            && self.low <= self.close
            && self.close <= self.high
    }
}
