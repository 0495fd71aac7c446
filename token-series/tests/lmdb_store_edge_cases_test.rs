/// Edge case tests for the LMDB snapshot store
///
/// These tests cover:
/// - Missing paths and databases
/// - Ordering of equal and negative timestamps
/// - Appends into an empty store and of new latest timestamps
/// - Range boundaries, including starts past the last key
/// - Trailing history reads
/// - Concurrent readers
use anyhow::Result;
use tempfile::TempDir;
use token_core::{Metric, Timeframe, TokenSnapshot};
use token_series::{LmdbSnapshotStore, SeriesConfig, SeriesPipeline, SeriesQuery, SnapshotStore};

fn snap(timestamp: i64, total: f64) -> TokenSnapshot {
    let mut snapshot = TokenSnapshot::new(timestamp);
    snapshot.total = total;
    snapshot
}

// Helper to create a writable store in a fresh temp directory
fn create_store(snapshots: &[TokenSnapshot]) -> Result<(TempDir, LmdbSnapshotStore)> {
    let dir = tempfile::tempdir()?;
    let store = LmdbSnapshotStore::open(dir.path())?;
    for snapshot in snapshots {
        store.append(snapshot)?;
    }
    Ok((dir, store))
}

#[cfg(test)]
mod lmdb_store_edge_cases {
    use super::*;

    #[test]
    fn test_nonexistent_path() {
        let result = LmdbSnapshotStore::open("/path/that/does/not/exist");
        assert!(result.is_err());
        let err = result.err().unwrap();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_read_only_without_database() {
        // Directory exists but nothing was ever ingested into it
        let fresh = tempfile::tempdir().unwrap();
        assert!(LmdbSnapshotStore::open_read_only(fresh.path()).is_err());
    }

    #[test]
    fn test_empty_store() {
        let (_dir, store) = create_store(&[]).unwrap();
        assert!(store.query_range(i64::MIN, i64::MAX).unwrap().is_empty());
        assert!(store.latest().unwrap().is_none());
        assert!(store.recent(100).unwrap().is_empty());
    }

    #[test]
    fn test_first_append_into_empty_store() {
        let (_dir, store) = create_store(&[]).unwrap();
        store.append(&snap(1_000, 1.0)).unwrap();

        let all = store.query_range(i64::MIN, i64::MAX).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].timestamp, 1_000);
    }

    #[test]
    fn test_each_append_a_new_latest_timestamp() {
        // The usual ingest pattern: every snapshot is newer than all stored ones
        let (_dir, store) = create_store(&[]).unwrap();
        for i in 0..5 {
            store.append(&snap(i * 900_000, i as f64)).unwrap();
            assert_eq!(store.latest().unwrap().map(|s| s.timestamp), Some(i * 900_000));
        }
        assert_eq!(store.query_range(0, 4 * 900_000).unwrap().len(), 5);
    }

    #[test]
    fn test_range_starting_after_last_key() {
        let (_dir, empty) = create_store(&[]).unwrap();
        assert!(empty.query_range(5_000, 10_000).unwrap().is_empty());

        let (_dir, store) = create_store(&[snap(10, 1.0), snap(20, 2.0)]).unwrap();
        assert!(store.query_range(21, i64::MAX).unwrap().is_empty());
        assert!(store.query_range(i64::MAX, i64::MAX).unwrap().is_empty());
    }

    #[test]
    fn test_series_with_window_end_past_data() {
        let snapshots: Vec<_> = (0..5).map(|i| snap(i * 900_000, 1.0 + i as f64)).collect();
        let (_dir, store) = create_store(&snapshots).unwrap();
        let config = SeriesConfig {
            tick_budget: 10,
            ..SeriesConfig::default()
        };
        let pipeline = SeriesPipeline::new(store, config);

        let mut query = SeriesQuery::new(Timeframe::M15, Metric::Total);
        query.window_end = Some(100 * 900_000);
        let result = pipeline.run(&query).unwrap();
        assert!(result.records.is_empty());
        assert_eq!(result.snapshots_used, 0);

        // A window that still overlaps the data carries the last close forward
        query.window_end = Some(8 * 900_000);
        let result = pipeline.run(&query).unwrap();
        assert_eq!(result.records.last().unwrap().date, 8 * 900_000);
        assert_eq!(result.records.last().unwrap().close, 5.0);
    }

    #[test]
    fn test_range_is_ascending_regardless_of_append_order() {
        let (_dir, store) = create_store(&[
            snap(3_000, 3.0),
            snap(-2_000, -2.0),
            snap(1_000, 1.0),
            snap(0, 0.0),
        ])
        .unwrap();

        let all = store.query_range(i64::MIN, i64::MAX).unwrap();
        let timestamps: Vec<_> = all.iter().map(|s| s.timestamp).collect();
        assert_eq!(timestamps, vec![-2_000, 0, 1_000, 3_000]);
    }

    #[test]
    fn test_equal_timestamps_keep_insertion_order() {
        let (_dir, store) = create_store(&[
            snap(5_000, 1.0),
            snap(5_000, 2.0),
            snap(4_000, 0.5),
            snap(5_000, 3.0),
        ])
        .unwrap();

        let at_five = store.query_range(5_000, 5_000).unwrap();
        let totals: Vec<_> = at_five.iter().map(|s| s.total).collect();
        assert_eq!(totals, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_range_boundaries_inclusive() {
        let (_dir, store) = create_store(&[snap(10, 1.0), snap(20, 2.0), snap(30, 3.0)]).unwrap();

        assert_eq!(store.query_range(10, 30).unwrap().len(), 3);
        assert_eq!(store.query_range(11, 30).unwrap().len(), 2);
        assert_eq!(store.query_range(10, 29).unwrap().len(), 2);
        assert_eq!(store.query_range(20, 20).unwrap().len(), 1);
        assert!(store.query_range(31, 100).unwrap().is_empty());
        assert!(store.query_range(30, 10).unwrap().is_empty());
    }

    #[test]
    fn test_recent_and_latest() {
        let (_dir, store) =
            create_store(&[snap(10, 1.0), snap(20, 2.0), snap(30, 3.0), snap(30, 4.0)]).unwrap();

        let recent = store.recent(2).unwrap();
        let totals: Vec<_> = recent.iter().map(|s| s.total).collect();
        assert_eq!(totals, vec![3.0, 4.0]);
        assert_eq!(store.latest().unwrap().map(|s| s.total), Some(4.0));
        assert_eq!(store.recent(0).unwrap().len(), 0);
        assert_eq!(store.recent(1_000).unwrap().len(), 4);
    }

    #[test]
    fn test_read_only_reopen_sees_appended_data() {
        let dir = tempfile::tempdir().unwrap();
        {
            let writer = LmdbSnapshotStore::open(dir.path()).unwrap();
            writer.append(&snap(1_730_811_225_000, 42.0)).unwrap();
        }

        let reader = LmdbSnapshotStore::open_read_only(dir.path()).unwrap();
        let latest = reader.latest().unwrap().unwrap();
        assert_eq!(latest.timestamp, 1_730_811_225_000);
        assert_eq!(latest.total, 42.0);
    }

    #[test]
    fn test_concurrent_reads() {
        use std::sync::Arc;
        use std::thread;

        let snapshots: Vec<_> = (0..100).map(|i| snap(i * 900_000, i as f64)).collect();
        let (_dir, store) = create_store(&snapshots).unwrap();
        let store = Arc::new(store);
        let mut handles = vec![];

        // Spawn 10 concurrent read threads
        for i in 0..10i64 {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                let start = i * 10 * 900_000;
                let hits = store.query_range(start, start + 9 * 900_000).unwrap();
                assert_eq!(hits.len(), 10);
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
