pub mod lmdb_store;
pub mod memory_store;

// Re-export commonly used items
pub use lmdb_store::LmdbSnapshotStore;
pub use memory_store::MemorySnapshotStore;

use anyhow::Result;
use std::sync::Arc;
use token_core::{TimestampMS, TokenSnapshot};

/// Read access to the append-only snapshot collection
///
/// Results are ascending by timestamp; snapshots sharing a timestamp keep
/// their insertion order.
pub trait SnapshotStore {
    /// Snapshots with `start <= timestamp <= end`
    fn query_range(&self, start: TimestampMS, end: TimestampMS) -> Result<Vec<TokenSnapshot>>;

    /// The trailing `limit` snapshots, oldest first
    fn recent(&self, limit: usize) -> Result<Vec<TokenSnapshot>>;

    fn latest(&self) -> Result<Option<TokenSnapshot>> {
        Ok(self.recent(1)?.pop())
    }
}

impl<S: SnapshotStore + ?Sized> SnapshotStore for Arc<S> {
    fn query_range(&self, start: TimestampMS, end: TimestampMS) -> Result<Vec<TokenSnapshot>> {
        (**self).query_range(start, end)
    }

    fn recent(&self, limit: usize) -> Result<Vec<TokenSnapshot>> {
        (**self).recent(limit)
    }

    fn latest(&self) -> Result<Option<TokenSnapshot>> {
        (**self).latest()
    }
}
