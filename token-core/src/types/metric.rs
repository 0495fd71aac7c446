use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SeriesError;
use crate::types::TokenSnapshot;

/// The metric a series is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    Total,
    Circulating,
    Fdv,
    #[serde(alias = "market_cap")]
    MarketCap,
    Liquidity,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::Total,
        Metric::Circulating,
        Metric::Fdv,
        Metric::MarketCap,
        Metric::Liquidity,
    ];

    /// Wire name, matching the snapshot document field
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Total => "total",
            Metric::Circulating => "circulating",
            Metric::Fdv => "fdv",
            Metric::MarketCap => "marketCap",
            Metric::Liquidity => "liquidity",
        }
    }

    /// Select this metric's value from a snapshot
    pub fn value(&self, snapshot: &TokenSnapshot) -> f64 {
        match self {
            Metric::Total => snapshot.total,
            Metric::Circulating => snapshot.circulating,
            Metric::Fdv => snapshot.fdv,
            Metric::MarketCap => snapshot.market_cap,
            Metric::Liquidity => snapshot.liquidity,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = SeriesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "total" => Ok(Metric::Total),
            "circulating" => Ok(Metric::Circulating),
            "fdv" => Ok(Metric::Fdv),
            "marketCap" | "market_cap" => Ok(Metric::MarketCap),
            "liquidity" => Ok(Metric::Liquidity),
            other => Err(SeriesError::InvalidMetric(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_wire_names() {
        for metric in Metric::ALL {
            assert_eq!(metric.as_str().parse::<Metric>().unwrap(), metric);
        }
        assert_eq!("market_cap".parse::<Metric>().unwrap(), Metric::MarketCap);
    }

    #[test]
    fn test_parse_unknown_metric() {
        let err = "price".parse::<Metric>().unwrap_err();
        assert_eq!(err, SeriesError::InvalidMetric("price".to_string()));
        assert!("MarketCap".parse::<Metric>().is_err());
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&Metric::MarketCap).unwrap(),
            "\"marketCap\""
        );
        let metric: Metric = serde_json::from_str("\"market_cap\"").unwrap();
        assert_eq!(metric, Metric::MarketCap);
    }
}
