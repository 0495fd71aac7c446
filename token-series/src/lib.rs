pub mod config;
pub mod series;
pub mod store;

// Re-export commonly used items
pub use config::{check_tick_budget, InputOrder, SeriesConfig, MAX_TICK_BUDGET};
pub use series::{
    aggregate, fill_gaps, fill_gaps_fixed, window, window_slice, AggregationRequest,
    BucketCalendar, CloseConvention, MonthMode, SeriesPipeline, SeriesQuery, SeriesResult,
};
pub use store::{LmdbSnapshotStore, MemorySnapshotStore, SnapshotStore};
