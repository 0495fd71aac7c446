use anyhow::{Context, Result};
use serde::Serialize;
use token_core::{Metric, OhlcRecord, Timeframe, TimestampMS};

use crate::config::SeriesConfig;
use crate::series::aggregator::{aggregate, AggregationRequest, CloseConvention};
use crate::series::calendar::MonthMode;
use crate::series::gap_filler::fill_gaps;
use crate::series::windower::window;
use crate::store::SnapshotStore;

/// One chart query; unset fields fall back to the pipeline config
#[derive(Debug, Clone)]
pub struct SeriesQuery {
    pub timeframe: Timeframe,
    pub metric: Metric,
    pub window_end: Option<TimestampMS>,
    pub tick_budget: Option<usize>,
    pub convention: Option<CloseConvention>,
    pub fill_gaps: Option<bool>,
}

impl SeriesQuery {
    pub fn new(timeframe: Timeframe, metric: Metric) -> Self {
        Self {
            timeframe,
            metric,
            window_end: None,
            tick_budget: None,
            convention: None,
            fill_gaps: None,
        }
    }
}

/// Series ready for the chart renderer
#[derive(Debug, Clone, Serialize)]
pub struct SeriesResult {
    pub timeframe: Timeframe,
    pub metric: Metric,
    pub bucket_ms: i64,
    pub month_mode: MonthMode,
    pub snapshots_used: usize,
    pub records: Vec<OhlcRecord>,
}

/// Store → aggregate → window → optional gap fill
pub struct SeriesPipeline<S: SnapshotStore> {
    store: S,
    config: SeriesConfig,
}

impl<S: SnapshotStore> SeriesPipeline<S> {
    pub fn new(store: S, config: SeriesConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &SeriesConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run one query against the store
    ///
    /// The window ends at `query.window_end` or, when unset, at the latest
    /// stored snapshot. An empty store gives an empty series.
    pub fn run(&self, query: &SeriesQuery) -> Result<SeriesResult> {
        let mut request =
            AggregationRequest::from_config(query.timeframe, query.metric, &self.config);
        if let Some(tick_budget) = query.tick_budget {
            request = request.with_tick_budget(tick_budget);
        }
        if let Some(convention) = query.convention {
            request = request.with_convention(convention);
        }

        let calendar = request.calendar();
        let mut result = SeriesResult {
            timeframe: query.timeframe,
            metric: query.metric,
            bucket_ms: calendar.duration_ms(),
            month_mode: request.month_mode,
            snapshots_used: 0,
            records: Vec::new(),
        };

        let window_end = match query.window_end {
            Some(end) => end,
            None => match self.store.latest().context("Failed to read latest snapshot")? {
                Some(latest) => latest.timestamp,
                None => {
                    tracing::debug!(
                        "No snapshots stored, returning empty {} series",
                        query.timeframe
                    );
                    return Ok(result);
                }
            },
        };
        request = request.with_window_end(window_end);

        let (window_start, _) = request.window_bounds(window_end)?;
        let snapshots = self
            .store
            .query_range(calendar.align(window_start)?, window_end)
            .context("Failed to query snapshot range")?;

        let records = aggregate(&snapshots, &request)?;
        let records = window(records, request.tick_budget);
        let records = if query.fill_gaps.unwrap_or(self.config.fill_gaps) {
            fill_gaps(&records, &calendar)?
        } else {
            records
        };

        tracing::debug!(
            "Series {} {}: {} snapshots -> {} records",
            query.metric,
            query.timeframe,
            snapshots.len(),
            records.len()
        );

        result.snapshots_used = snapshots.len();
        result.records = records;
        Ok(result)
    }
}
