pub mod aggregator;
pub mod calendar;
pub mod gap_filler;
pub mod pipeline;
pub mod windower;

// Re-export commonly used items
pub use aggregator::{aggregate, AggregationRequest, CloseConvention};
pub use calendar::{align_to_bucket, bucket_duration, next_bucket, BucketCalendar, MonthMode};
pub use gap_filler::{fill_gaps, fill_gaps_fixed};
pub use pipeline::{SeriesPipeline, SeriesQuery, SeriesResult};
pub use windower::{window, window_slice};
