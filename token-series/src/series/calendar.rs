use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use token_core::types::timeframe::DAY_MS;
use token_core::{SeriesError, Timeframe, TimestampMS};

/// 1970-01-05, the first Monday after the epoch
const FIRST_MONDAY_MS: TimestampMS = 4 * DAY_MS;

/// How `1M` buckets are laid out
///
/// The two modes disagree near month boundaries: fixed-stride keys are
/// multiples of 30 days since the epoch and drift against real month starts
/// by up to a few days per month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonthMode {
    /// Uniform 30-day buckets
    #[default]
    FixedStride,
    /// Buckets start on the 1st of each UTC calendar month
    Calendar,
}

impl fmt::Display for MonthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonthMode::FixedStride => f.write_str("fixed_stride"),
            MonthMode::Calendar => f.write_str("calendar"),
        }
    }
}

impl FromStr for MonthMode {
    type Err = SeriesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fixed_stride" => Ok(MonthMode::FixedStride),
            "calendar" => Ok(MonthMode::Calendar),
            other => Err(SeriesError::InvalidMonthMode(other.to_string())),
        }
    }
}

/// Nominal bucket width for a timeframe
pub fn bucket_duration(timeframe: Timeframe) -> i64 {
    timeframe.duration_ms()
}

/// Start of the UTC-aligned bucket containing `timestamp`
///
/// Idempotent: aligning a bucket key returns the same key.
pub fn align_to_bucket(
    timestamp: TimestampMS,
    timeframe: Timeframe,
    month_mode: MonthMode,
) -> Result<TimestampMS, SeriesError> {
    match (timeframe, month_mode) {
        (Timeframe::W1, _) => floor_to(timestamp, timeframe.duration_ms(), FIRST_MONDAY_MS),
        (Timeframe::Month1, MonthMode::Calendar) => floor_to_month(timestamp),
        _ => floor_to(timestamp, timeframe.duration_ms(), 0),
    }
}

/// Key of the bucket following `key`
pub fn next_bucket(
    key: TimestampMS,
    timeframe: Timeframe,
    month_mode: MonthMode,
) -> Result<TimestampMS, SeriesError> {
    match (timeframe, month_mode) {
        (Timeframe::Month1, MonthMode::Calendar) => {
            let next = to_datetime(key)?
                .checked_add_months(Months::new(1))
                .ok_or(SeriesError::TimestampOutOfRange(key))?;
            Ok(next.timestamp_millis())
        }
        _ => key
            .checked_add(timeframe.duration_ms())
            .ok_or(SeriesError::TimestampOutOfRange(key)),
    }
}

fn floor_to(
    timestamp: TimestampMS,
    width: i64,
    origin: TimestampMS,
) -> Result<TimestampMS, SeriesError> {
    let out_of_range = || SeriesError::TimestampOutOfRange(timestamp);
    let shifted = timestamp.checked_sub(origin).ok_or_else(out_of_range)?;
    let floored = shifted
        .checked_sub(shifted.rem_euclid(width))
        .ok_or_else(out_of_range)?;
    floored.checked_add(origin).ok_or_else(out_of_range)
}

fn floor_to_month(timestamp: TimestampMS) -> Result<TimestampMS, SeriesError> {
    let dt = to_datetime(timestamp)?;
    let first = NaiveDate::from_ymd_opt(dt.year(), dt.month(), 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or(SeriesError::TimestampOutOfRange(timestamp))?;
    Ok(first.and_utc().timestamp_millis())
}

fn to_datetime(timestamp: TimestampMS) -> Result<DateTime<Utc>, SeriesError> {
    DateTime::<Utc>::from_timestamp_millis(timestamp)
        .ok_or(SeriesError::TimestampOutOfRange(timestamp))
}

/// A timeframe together with its month layout.
///
/// The aggregator and the gap filler both step through buckets with the
/// same calendar, so they always agree on where buckets start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketCalendar {
    pub timeframe: Timeframe,
    pub month_mode: MonthMode,
}

impl BucketCalendar {
    pub fn new(timeframe: Timeframe, month_mode: MonthMode) -> Self {
        Self {
            timeframe,
            month_mode,
        }
    }

    pub fn duration_ms(&self) -> i64 {
        bucket_duration(self.timeframe)
    }

    pub fn align(&self, timestamp: TimestampMS) -> Result<TimestampMS, SeriesError> {
        align_to_bucket(timestamp, self.timeframe, self.month_mode)
    }

    pub fn next(&self, key: TimestampMS) -> Result<TimestampMS, SeriesError> {
        next_bucket(key, self.timeframe, self.month_mode)
    }

    /// Every bucket key from `align(start)` to `align(end)` inclusive
    pub fn keys(
        &self,
        start: TimestampMS,
        end: TimestampMS,
    ) -> Result<Vec<TimestampMS>, SeriesError> {
        let last = self.align(end)?;
        let mut key = self.align(start)?;
        let mut keys = Vec::new();

        while key <= last {
            keys.push(key);
            key = self.next(key)?;
        }

        Ok(keys)
    }
}
