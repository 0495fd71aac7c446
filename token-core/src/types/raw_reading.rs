use serde::{Deserialize, Serialize};

use crate::error::SeriesError;
use crate::types::{TimestampMS, TokenSnapshot};

/// Supply endpoints report amounts in 18-decimal base units
pub const BASE_UNITS_PER_TOKEN: f64 = 1e18;

/// An amount as reported upstream: either a JSON number or a decimal string
/// (large base-unit values are usually sent as strings)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    Number(f64),
    Text(String),
}

impl RawAmount {
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            RawAmount::Number(n) => Some(*n),
            RawAmount::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }
}

/// Un-normalized collector reading, one per poll
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTokenReading {
    /// Missing when the collector leaves stamping to the store writer
    #[serde(default)]
    pub timestamp: Option<TimestampMS>,
    pub total: RawAmount,       // base units
    pub circulating: RawAmount, // base units
    pub fdv: RawAmount,
    pub market_cap: RawAmount,
    pub liquidity: RawAmount,
}

impl RawTokenReading {
    /// Convert to a stored snapshot
    ///
    /// Supply fields are divided by 10^18. `received_at` stamps readings that
    /// carry no timestamp of their own.
    pub fn normalize(&self, received_at: TimestampMS) -> Result<TokenSnapshot, SeriesError> {
        let timestamp = self.timestamp.unwrap_or(received_at);

        let parse = |name: &str, amount: &RawAmount| -> Result<f64, SeriesError> {
            amount.to_f64().ok_or_else(|| SeriesError::InvalidSnapshot {
                timestamp,
                reason: format!("{} is not a number ({:?})", name, amount),
            })
        };

        let snapshot = TokenSnapshot {
            timestamp,
            total: parse("total", &self.total)? / BASE_UNITS_PER_TOKEN,
            circulating: parse("circulating", &self.circulating)? / BASE_UNITS_PER_TOKEN,
            fdv: parse("fdv", &self.fdv)?,
            market_cap: parse("marketCap", &self.market_cap)?,
            liquidity: parse("liquidity", &self.liquidity)?,
        };

        snapshot.validate()?;
        Ok(snapshot)
    }
}
