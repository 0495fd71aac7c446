use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SeriesError;

pub const MINUTE_MS: i64 = 60_000;
pub const HOUR_MS: i64 = 60 * MINUTE_MS;
pub const DAY_MS: i64 = 24 * HOUR_MS;

/// Bucket granularity of a candlestick series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "1d")]
    D1,
    #[serde(rename = "1w")]
    W1,
    #[serde(rename = "1M")]
    Month1,
}

impl Timeframe {
    pub const ALL: [Timeframe; 6] = [
        Timeframe::M15,
        Timeframe::H1,
        Timeframe::H4,
        Timeframe::D1,
        Timeframe::W1,
        Timeframe::Month1,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::M15 => "15m",
            Timeframe::H1 => "1h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1d",
            Timeframe::W1 => "1w",
            Timeframe::Month1 => "1M",
        }
    }

    /// Nominal bucket width in milliseconds
    ///
    /// `1M` is a fixed 30-day approximation, not a calendar month.
    pub fn duration_ms(&self) -> i64 {
        match self {
            Timeframe::M15 => 15 * MINUTE_MS,
            Timeframe::H1 => HOUR_MS,
            Timeframe::H4 => 4 * HOUR_MS,
            Timeframe::D1 => DAY_MS,
            Timeframe::W1 => 7 * DAY_MS,
            Timeframe::Month1 => 30 * DAY_MS,
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = SeriesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "15m" => Ok(Timeframe::M15),
            "1h" => Ok(Timeframe::H1),
            "4h" => Ok(Timeframe::H4),
            "1d" => Ok(Timeframe::D1),
            "1w" => Ok(Timeframe::W1),
            "1M" => Ok(Timeframe::Month1),
            other => Err(SeriesError::InvalidTimeframe(other.to_string())),
        }
    }
}
