use serde::{Deserialize, Serialize};
use serde_json::Value;
use token_core::{timestamp_to_rfc3339, OhlcRecord, TimestampMS};
use token_series::CloseConvention;

/// JSON-RPC 2.0 Request
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: Option<Value>,
    pub method: String,
    pub params: Option<Value>,
}

// Standard JSON-RPC error codes
pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

// Custom error codes for series operations
pub const INVALID_TIMEFRAME: i32 = -32010;
pub const INVALID_METRIC: i32 = -32011;
pub const STORE_ERROR: i32 = -32012;
pub const INVALID_SERIES_INPUT: i32 = -32013;

/// series.ohlc Request Parameters
///
/// `timeframe` and `metric` stay strings here so that unknown values get
/// their own error codes instead of a generic params failure.
#[derive(Debug, Deserialize)]
pub struct OhlcQueryRequest {
    pub timeframe: String,
    pub metric: String,
    #[serde(default)]
    pub window_end: Option<TimestampMS>,
    #[serde(default)]
    pub tick_budget: Option<usize>,
    #[serde(default)]
    pub convention: Option<CloseConvention>,
    #[serde(default)]
    pub fill_gaps: Option<bool>,
}

/// series.history Request Parameters
#[derive(Debug, Default, Deserialize)]
pub struct HistoryRequest {
    #[serde(default)]
    pub limit: Option<usize>,
}

/// series.ohlc Response
#[derive(Debug, Serialize)]
pub struct OhlcQueryResponse {
    pub timeframe: String,
    pub metric: String,
    pub bucket_ms: i64,
    pub month_mode: String,
    pub records: Vec<CandleJson>,
    pub metadata: Metadata,
}

/// One OHLC bucket in JSON format
#[derive(Debug, Serialize)]
pub struct CandleJson {
    pub date: TimestampMS,
    /// RFC3339 rendering of `date`
    pub time: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl From<&OhlcRecord> for CandleJson {
    fn from(record: &OhlcRecord) -> Self {
        Self {
            date: record.date,
            time: timestamp_to_rfc3339(record.date).unwrap_or_default(),
            open: record.open,
            high: record.high,
            low: record.low,
            close: record.close,
        }
    }
}

/// Query metadata
#[derive(Debug, Serialize)]
pub struct Metadata {
    pub snapshots_used: usize,
    pub query_duration_ms: u64,
    pub tick_budget: usize,
    pub convention: CloseConvention,
    pub gaps_filled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ohlc_request_optional_fields() {
        let req: OhlcQueryRequest =
            serde_json::from_str(r#"{"timeframe": "1h", "metric": "marketCap"}"#).unwrap();
        assert_eq!(req.timeframe, "1h");
        assert_eq!(req.metric, "marketCap");
        assert!(req.window_end.is_none());
        assert!(req.tick_budget.is_none());
        assert!(req.convention.is_none());
        assert!(req.fill_gaps.is_none());
    }

    #[test]
    fn test_ohlc_request_convention() {
        let req: OhlcQueryRequest = serde_json::from_str(
            r#"{"timeframe": "15m", "metric": "fdv", "convention": "next_open", "tick_budget": 72}"#,
        )
        .unwrap();
        assert_eq!(req.convention, Some(CloseConvention::NextOpen));
        assert_eq!(req.tick_budget, Some(72));

        let bad = serde_json::from_str::<OhlcQueryRequest>(
            r#"{"timeframe": "15m", "metric": "fdv", "convention": "midpoint"}"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn test_candle_json_carries_iso_time() {
        let candle = CandleJson::from(&OhlcRecord::flat(1_730_811_225_000, 2.5));
        let json = serde_json::to_value(&candle).unwrap();
        assert_eq!(json["date"], 1_730_811_225_000i64);
        assert_eq!(json["time"], "2024-11-05T12:53:45.000Z");
        assert_eq!(json["close"], 2.5);
    }

    #[test]
    fn test_parse_jsonrpc_request() {
        let json = r#"{
            "jsonrpc": "2.0",
            "id": 1,
            "method": "series.ohlc",
            "params": {}
        }"#;

        let req: JsonRpcRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.jsonrpc, "2.0");
        assert_eq!(req.method, "series.ohlc");
    }
}
