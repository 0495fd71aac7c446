use anyhow::Result;
use token_core::{TimestampMS, TokenSnapshot};

use super::SnapshotStore;

/// In-process snapshot collection kept in timestamp order
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStore {
    snapshots: Vec<TokenSnapshot>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from snapshots in any order; equal timestamps keep their order
    pub fn from_snapshots(mut snapshots: Vec<TokenSnapshot>) -> Self {
        snapshots.sort_by_key(|s| s.timestamp);
        Self { snapshots }
    }

    /// Insert after every snapshot with the same or an earlier timestamp
    pub fn append(&mut self, snapshot: TokenSnapshot) {
        let at = self
            .snapshots
            .partition_point(|s| s.timestamp <= snapshot.timestamp);
        self.snapshots.insert(at, snapshot);
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn query_range(&self, start: TimestampMS, end: TimestampMS) -> Result<Vec<TokenSnapshot>> {
        let from = self.snapshots.partition_point(|s| s.timestamp < start);
        let to = self.snapshots.partition_point(|s| s.timestamp <= end);
        Ok(self.snapshots.get(from..to).map(<[_]>::to_vec).unwrap_or_default())
    }

    fn recent(&self, limit: usize) -> Result<Vec<TokenSnapshot>> {
        let from = self.snapshots.len().saturating_sub(limit);
        Ok(self.snapshots[from..].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(timestamp: TimestampMS, total: f64) -> TokenSnapshot {
        let mut snapshot = TokenSnapshot::new(timestamp);
        snapshot.total = total;
        snapshot
    }

    #[test]
    fn test_append_keeps_order() {
        let mut store = MemorySnapshotStore::new();
        store.append(snap(30, 3.0));
        store.append(snap(10, 1.0));
        store.append(snap(30, 4.0));
        store.append(snap(20, 2.0));

        let all = store.query_range(i64::MIN, i64::MAX).unwrap();
        let totals: Vec<_> = all.iter().map(|s| s.total).collect();
        assert_eq!(totals, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_query_range_is_inclusive() {
        let store =
            MemorySnapshotStore::from_snapshots(vec![snap(10, 1.0), snap(20, 2.0), snap(30, 3.0)]);
        let hits = store.query_range(10, 20).unwrap();
        assert_eq!(hits.len(), 2);
        assert!(store.query_range(21, 29).unwrap().is_empty());
        assert!(store.query_range(30, 10).unwrap().is_empty());
    }

    #[test]
    fn test_recent_and_latest() {
        let store =
            MemorySnapshotStore::from_snapshots(vec![snap(30, 3.0), snap(10, 1.0), snap(20, 2.0)]);
        let recent = store.recent(2).unwrap();
        assert_eq!(recent.iter().map(|s| s.timestamp).collect::<Vec<_>>(), vec![20, 30]);
        assert_eq!(store.latest().unwrap().map(|s| s.timestamp), Some(30));
        assert_eq!(store.recent(100).unwrap().len(), 3);

        assert!(MemorySnapshotStore::new().latest().unwrap().is_none());
    }
}
