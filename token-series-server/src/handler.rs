use std::sync::Arc;
use std::time::Instant;
use token_core::{Metric, Timeframe, TokenSnapshot};
use token_series::{SeriesPipeline, SeriesQuery, SnapshotStore, MAX_TICK_BUDGET};

use crate::error::RpcError;
use crate::protocol::*;

/// Largest `series.history` page
pub const MAX_HISTORY_LIMIT: usize = 10_000;

pub type SharedStore = Arc<dyn SnapshotStore + Send + Sync>;

/// Handler for series queries
pub struct SeriesQueryHandler {
    pipeline: Arc<SeriesPipeline<SharedStore>>,
    history_limit: usize,
}

impl SeriesQueryHandler {
    pub fn new(pipeline: SeriesPipeline<SharedStore>, history_limit: usize) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            history_limit,
        }
    }

    /// Handle a series.ohlc request
    pub async fn handle_ohlc(
        &self,
        params: OhlcQueryRequest,
    ) -> Result<OhlcQueryResponse, RpcError> {
        let query_start = Instant::now();

        let timeframe: Timeframe = params.timeframe.parse()?;
        let metric: Metric = params.metric.parse()?;

        if let Some(tick_budget) = params.tick_budget {
            if tick_budget > MAX_TICK_BUDGET {
                return Err(RpcError::InvalidParams(format!(
                    "tick_budget {} exceeds maximum {}",
                    tick_budget, MAX_TICK_BUDGET
                )));
            }
        }

        tracing::debug!(
            "Handling OHLC query: timeframe={}, metric={}, window_end={:?}, tick_budget={:?}",
            timeframe,
            metric,
            params.window_end,
            params.tick_budget
        );

        let config = self.pipeline.config();
        let query = SeriesQuery {
            timeframe,
            metric,
            window_end: params.window_end,
            tick_budget: params.tick_budget,
            convention: params.convention,
            fill_gaps: params.fill_gaps,
        };
        let tick_budget = query.tick_budget.unwrap_or(config.tick_budget);
        let convention = query.convention.unwrap_or(config.convention);
        let gaps_filled = query.fill_gaps.unwrap_or(config.fill_gaps);

        let pipeline = Arc::clone(&self.pipeline);
        let result = tokio::task::spawn_blocking(move || pipeline.run(&query))
            .await
            .map_err(|e| RpcError::InternalError(format!("Query task failed: {}", e)))?
            .map_err(RpcError::from_pipeline)?;

        let query_duration = query_start.elapsed().as_millis() as u64;

        tracing::info!(
            "OHLC query completed: metric={}, timeframe={}, records={}, duration={}ms",
            metric,
            timeframe,
            result.records.len(),
            query_duration
        );

        Ok(OhlcQueryResponse {
            timeframe: result.timeframe.to_string(),
            metric: result.metric.to_string(),
            bucket_ms: result.bucket_ms,
            month_mode: result.month_mode.to_string(),
            records: result.records.iter().map(CandleJson::from).collect(),
            metadata: Metadata {
                snapshots_used: result.snapshots_used,
                query_duration_ms: query_duration,
                tick_budget,
                convention,
                gaps_filled,
            },
        })
    }

    /// Handle a series.latest request
    pub async fn handle_latest(&self) -> Result<Option<TokenSnapshot>, RpcError> {
        let pipeline = Arc::clone(&self.pipeline);
        tokio::task::spawn_blocking(move || pipeline.store().latest())
            .await
            .map_err(|e| RpcError::InternalError(format!("Query task failed: {}", e)))?
            .map_err(|e| RpcError::StoreError(format!("{:#}", e)))
    }

    /// Handle a series.history request
    pub async fn handle_history(
        &self,
        params: HistoryRequest,
    ) -> Result<Vec<TokenSnapshot>, RpcError> {
        let limit = params.limit.unwrap_or(self.history_limit);
        if limit > MAX_HISTORY_LIMIT {
            return Err(RpcError::InvalidParams(format!(
                "limit {} exceeds maximum {}",
                limit, MAX_HISTORY_LIMIT
            )));
        }

        let pipeline = Arc::clone(&self.pipeline);
        let snapshots = tokio::task::spawn_blocking(move || pipeline.store().recent(limit))
            .await
            .map_err(|e| RpcError::InternalError(format!("Query task failed: {}", e)))?
            .map_err(|e| RpcError::StoreError(format!("{:#}", e)))?;

        tracing::debug!(
            "History query returned {} snapshots (limit {})",
            snapshots.len(),
            limit
        );
        Ok(snapshots)
    }
}
