use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use token_core::{Metric, OhlcRecord, SeriesError, Timeframe, TimestampMS, TokenSnapshot};

use crate::config::{check_tick_budget, InputOrder, SeriesConfig};
use crate::series::calendar::{BucketCalendar, MonthMode};

/// Which value closes a bucket that holds data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseConvention {
    /// The bucket's own last value
    #[default]
    OwnBucket,
    /// The open of the next bucket when it holds data, else the own last value.
    /// High and low are widened to include that close.
    NextOpen,
}

/// Parameters of one aggregation call
#[derive(Debug, Clone)]
pub struct AggregationRequest {
    pub timeframe: Timeframe,
    pub metric: Metric,
    pub tick_budget: usize,
    /// Defaults to the latest snapshot timestamp
    pub window_end: Option<TimestampMS>,
    pub convention: CloseConvention,
    pub month_mode: MonthMode,
    pub input_order: InputOrder,
}

impl AggregationRequest {
    pub fn new(timeframe: Timeframe, metric: Metric) -> Self {
        Self::from_config(timeframe, metric, &SeriesConfig::default())
    }

    pub fn from_config(timeframe: Timeframe, metric: Metric, config: &SeriesConfig) -> Self {
        Self {
            timeframe,
            metric,
            tick_budget: config.tick_budget,
            window_end: None,
            convention: config.convention,
            month_mode: config.month_mode,
            input_order: config.input_order,
        }
    }

    pub fn with_window_end(mut self, window_end: TimestampMS) -> Self {
        self.window_end = Some(window_end);
        self
    }

    pub fn with_tick_budget(mut self, tick_budget: usize) -> Self {
        self.tick_budget = tick_budget;
        self
    }

    pub fn with_convention(mut self, convention: CloseConvention) -> Self {
        self.convention = convention;
        self
    }

    pub fn with_month_mode(mut self, month_mode: MonthMode) -> Self {
        self.month_mode = month_mode;
        self
    }

    pub fn with_input_order(mut self, input_order: InputOrder) -> Self {
        self.input_order = input_order;
        self
    }

    pub fn calendar(&self) -> BucketCalendar {
        BucketCalendar::new(self.timeframe, self.month_mode)
    }

    /// `[window_start, window_end]` for a given end instant
    pub fn window_bounds(
        &self,
        window_end: TimestampMS,
    ) -> Result<(TimestampMS, TimestampMS), SeriesError> {
        check_tick_budget(self.tick_budget)?;
        let span = i64::try_from(self.tick_budget)
            .ok()
            .and_then(|ticks| ticks.checked_mul(self.calendar().duration_ms()))
            .ok_or(SeriesError::TimestampOutOfRange(window_end))?;
        let window_start = window_end
            .checked_sub(span)
            .ok_or(SeriesError::TimestampOutOfRange(window_end))?;
        Ok((window_start, window_end))
    }
}

/// Running OHLC state of one bucket, fed in timestamp order
#[derive(Debug, Clone, Copy)]
struct BucketStats {
    open: f64,
    high: f64,
    low: f64,
    close: f64,
}

impl BucketStats {
    fn new(value: f64) -> Self {
        Self {
            open: value,
            high: value,
            low: value,
            close: value,
        }
    }

    fn push(&mut self, value: f64) {
        self.high = self.high.max(value);
        self.low = self.low.min(value);
        self.close = value;
    }

    fn to_record(self, date: TimestampMS, next_open: Option<f64>) -> OhlcRecord {
        let close = next_open.unwrap_or(self.close);
        OhlcRecord {
            date,
            open: self.open,
            high: self.high.max(close),
            low: self.low.min(close),
            close,
        }
    }
}

/// Build the OHLC series of one metric over one timeframe
///
/// Every bucket key between the aligned window start and the aligned window
/// end is visited. Buckets without snapshots repeat the previous close as a
/// flat candle; leading buckets with nothing to carry are omitted.
/// Empty input yields an empty series.
pub fn aggregate(
    snapshots: &[TokenSnapshot],
    request: &AggregationRequest,
) -> Result<Vec<OhlcRecord>, SeriesError> {
    check_tick_budget(request.tick_budget)?;

    let ordered = order_input(snapshots, request.input_order)?;
    let latest = match ordered.last() {
        Some(snapshot) => snapshot.timestamp,
        None => return Ok(Vec::new()),
    };

    let calendar = request.calendar();
    let (window_start, window_end) = request.window_bounds(request.window_end.unwrap_or(latest))?;
    let keys = calendar.keys(window_start, window_end)?;
    let first_key = match keys.first() {
        Some(&key) => key,
        None => return Ok(Vec::new()),
    };

    let mut buckets: BTreeMap<TimestampMS, BucketStats> = BTreeMap::new();
    for snapshot in ordered.iter() {
        if snapshot.timestamp < first_key || snapshot.timestamp > window_end {
            continue;
        }
        snapshot.validate_metric(request.metric)?;

        let value = request.metric.value(snapshot);
        let key = calendar.align(snapshot.timestamp)?;
        buckets
            .entry(key)
            .and_modify(|stats| stats.push(value))
            .or_insert_with(|| BucketStats::new(value));
    }

    let (records, _) = keys.iter().enumerate().fold(
        (Vec::with_capacity(keys.len()), None::<f64>),
        |(mut records, prev_close), (i, &key)| match buckets.get(&key) {
            Some(stats) => {
                let next_open = match request.convention {
                    CloseConvention::OwnBucket => None,
                    CloseConvention::NextOpen => keys
                        .get(i + 1)
                        .and_then(|next| buckets.get(next))
                        .map(|next| next.open),
                };
                let record = stats.to_record(key, next_open);
                records.push(record);
                (records, Some(record.close))
            }
            None => {
                if let Some(close) = prev_close {
                    records.push(OhlcRecord::flat(key, close));
                }
                (records, prev_close)
            }
        },
    );

    tracing::debug!(
        "Aggregated {} {} over {}ms: {} snapshots, {} buckets with data, {} records (month mode: {})",
        request.metric,
        request.timeframe,
        window_end - window_start,
        ordered.len(),
        buckets.len(),
        records.len(),
        request.month_mode
    );

    Ok(records)
}

fn order_input(
    snapshots: &[TokenSnapshot],
    policy: InputOrder,
) -> Result<Cow<'_, [TokenSnapshot]>, SeriesError> {
    let unordered = snapshots
        .windows(2)
        .position(|pair| pair[1].timestamp < pair[0].timestamp);

    match (unordered, policy) {
        (None, _) => Ok(Cow::Borrowed(snapshots)),
        (Some(i), InputOrder::Reject) => Err(SeriesError::NonMonotonicInput { index: i + 1 }),
        (Some(i), InputOrder::Sort) => {
            tracing::warn!(
                "Snapshots out of order at index {}, sorting {} entries",
                i + 1,
                snapshots.len()
            );
            let mut sorted = snapshots.to_vec();
            sorted.sort_by_key(|snapshot| snapshot.timestamp);
            Ok(Cow::Owned(sorted))
        }
    }
}
