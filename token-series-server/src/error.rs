use thiserror::Error;
use token_core::{Metric, SeriesError, Timeframe};

#[derive(Error, Debug)]
pub enum RpcError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Invalid timeframe: {0}")]
    InvalidTimeframe(String),

    #[error("Invalid metric: {0}")]
    InvalidMetric(String),

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Invalid series input: {0}")]
    InvalidSeriesInput(String),
}

impl RpcError {
    /// Get the JSON-RPC error code for this error
    pub fn code(&self) -> i32 {
        use crate::protocol::*;
        match self {
            RpcError::ParseError(_) => PARSE_ERROR,
            RpcError::InvalidRequest(_) => INVALID_REQUEST,
            RpcError::MethodNotFound(_) => METHOD_NOT_FOUND,
            RpcError::InvalidParams(_) => INVALID_PARAMS,
            RpcError::InternalError(_) => INTERNAL_ERROR,
            RpcError::InvalidTimeframe(_) => INVALID_TIMEFRAME,
            RpcError::InvalidMetric(_) => INVALID_METRIC,
            RpcError::StoreError(_) => STORE_ERROR,
            RpcError::InvalidSeriesInput(_) => INVALID_SERIES_INPUT,
        }
    }

    /// Get additional error data (optional)
    pub fn data(&self) -> Option<serde_json::Value> {
        match self {
            RpcError::InvalidTimeframe(_) => Some(serde_json::json!({
                "supported": Timeframe::ALL.iter().map(|tf| tf.as_str()).collect::<Vec<_>>(),
            })),
            RpcError::InvalidMetric(_) => Some(serde_json::json!({
                "supported": Metric::ALL.iter().map(|m| m.as_str()).collect::<Vec<_>>(),
            })),
            _ => None,
        }
    }

    /// Classify a pipeline failure: engine errors are the caller's input,
    /// anything else came from the store
    pub fn from_pipeline(err: anyhow::Error) -> Self {
        match err.downcast::<SeriesError>() {
            Ok(series_err) => series_err.into(),
            Err(other) => RpcError::StoreError(format!("{:#}", other)),
        }
    }
}

impl From<SeriesError> for RpcError {
    fn from(err: SeriesError) -> Self {
        match err {
            SeriesError::InvalidTimeframe(tf) => RpcError::InvalidTimeframe(tf),
            SeriesError::InvalidMetric(metric) => RpcError::InvalidMetric(metric),
            other => RpcError::InvalidSeriesInput(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_series_errors_map_to_codes() {
        let err: RpcError = SeriesError::InvalidTimeframe("5m".to_string()).into();
        assert_eq!(err.code(), crate::protocol::INVALID_TIMEFRAME);
        assert!(err.data().unwrap()["supported"].as_array().unwrap().len() == 6);

        let err: RpcError = SeriesError::InvalidTickBudget {
            requested: 0,
            max: 5_000,
        }
        .into();
        assert_eq!(err.code(), crate::protocol::INVALID_SERIES_INPUT);
    }

    #[test]
    fn test_from_pipeline_downcasts_engine_errors() {
        let engine: anyhow::Error = SeriesError::NonMonotonicInput { index: 3 }.into();
        assert!(matches!(RpcError::from_pipeline(engine), RpcError::InvalidSeriesInput(_)));

        let store = Err::<(), _>(anyhow::anyhow!("disk gone"))
            .context("Failed to query snapshot range")
            .unwrap_err();
        let err = RpcError::from_pipeline(store);
        assert_eq!(err.code(), crate::protocol::STORE_ERROR);
        assert!(err.to_string().contains("disk gone"));
    }
}
