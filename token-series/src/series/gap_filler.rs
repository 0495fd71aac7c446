use token_core::{OhlcRecord, SeriesError, TimestampMS};

use crate::series::calendar::BucketCalendar;

/// Insert flat candles for missing buckets between consecutive records
///
/// Each synthetic candle repeats the preceding record's close. Steps follow
/// `calendar`, the same one the aggregator used for the series. Running the
/// filler on its own output changes nothing.
pub fn fill_gaps(
    series: &[OhlcRecord],
    calendar: &BucketCalendar,
) -> Result<Vec<OhlcRecord>, SeriesError> {
    fill_with(series, |date| calendar.next(date))
}

/// [`fill_gaps`] with a raw fixed stride in milliseconds
pub fn fill_gaps_fixed(
    series: &[OhlcRecord],
    step_ms: i64,
) -> Result<Vec<OhlcRecord>, SeriesError> {
    if step_ms <= 0 {
        return Err(SeriesError::InvalidStep(step_ms));
    }
    fill_with(series, |date| {
        date.checked_add(step_ms)
            .ok_or(SeriesError::TimestampOutOfRange(date))
    })
}

fn fill_with<F>(series: &[OhlcRecord], step: F) -> Result<Vec<OhlcRecord>, SeriesError>
where
    F: Fn(TimestampMS) -> Result<TimestampMS, SeriesError>,
{
    let last = match series.last() {
        Some(&last) if series.len() >= 2 => last,
        _ => return Ok(series.to_vec()),
    };

    let mut filled = Vec::with_capacity(series.len());
    let mut inserted = 0usize;

    for pair in series.windows(2) {
        let (current, next) = (pair[0], pair[1]);
        filled.push(current);

        // A candle fits only if the step after it does not pass the next record
        let mut candidate = step(current.date)?;
        while candidate < next.date {
            let following = step(candidate)?;
            if following > next.date {
                break;
            }
            filled.push(OhlcRecord::flat(candidate, current.close));
            inserted += 1;
            candidate = following;
        }
    }
    filled.push(last);

    if inserted > 0 {
        tracing::debug!("Gap filler inserted {} flat candles", inserted);
    }

    Ok(filled)
}
