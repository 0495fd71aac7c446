use crate::error::SeriesError;
use crate::types::{Metric, TimestampMS};
use serde::{Deserialize, Serialize};

/// One timestamped reading of token metrics, as written by the collector.
///
/// Supply fields are already converted from base units to whole tokens;
/// FDV, market cap and liquidity are in display (USD) units.
/// Snapshots are immutable once stored and several may share a timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSnapshot {
    // ═══════════════════════════════════════════════════
    // IDENTIFICATION
    // ═══════════════════════════════════════════════════
    pub timestamp: TimestampMS,

    // ═══════════════════════════════════════════════════
    // SUPPLY (whole tokens)
    // ═══════════════════════════════════════════════════
    pub total: f64,
    pub circulating: f64,

    // ═══════════════════════════════════════════════════
    // VALUATION (display units)
    // ═══════════════════════════════════════════════════
    pub fdv: f64,
    pub market_cap: f64, // Circulating market cap
    pub liquidity: f64,  // Pool liquidity depth
}

impl TokenSnapshot {
    /// Create a snapshot with all metrics zeroed
    pub fn new(timestamp: TimestampMS) -> Self {
        Self {
            timestamp,
            total: 0.0,
            circulating: 0.0,
            fdv: 0.0,
            market_cap: 0.0,
            liquidity: 0.0,
        }
    }

    /// Read one metric through the typed selector
    pub fn value(&self, metric: Metric) -> f64 {
        metric.value(self)
    }

    /// Check that every metric is a finite, non-negative number
    pub fn validate(&self) -> Result<(), SeriesError> {
        for metric in Metric::ALL {
            self.validate_metric(metric)?;
        }
        Ok(())
    }

    /// Check a single metric the way the aggregator needs it
    pub fn validate_metric(&self, metric: Metric) -> Result<(), SeriesError> {
        let value = self.value(metric);
        if !value.is_finite() {
            return Err(SeriesError::InvalidSnapshot {
                timestamp: self.timestamp,
                reason: format!("{} is not finite ({})", metric, value),
            });
        }
        if value < 0.0 {
            return Err(SeriesError::InvalidSnapshot {
                timestamp: self.timestamp,
                reason: format!("{} is negative ({})", metric, value),
            });
        }
        Ok(())
    }
}
