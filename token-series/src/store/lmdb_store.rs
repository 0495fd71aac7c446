use anyhow::{anyhow, Context, Result};
use lmdb::{Cursor, Database, DatabaseFlags, Environment, Transaction, WriteFlags};
use std::path::Path;
use token_core::{TimestampMS, TokenSnapshot};

use super::SnapshotStore;

const SNAPSHOT_DB: &str = "snapshots";
const MAX_DBS: u32 = 4;
const MAP_SIZE: usize = 1 << 30;
const SIGN_BIT: u64 = 1 << 63;

/// LMDB-backed snapshot collection
///
/// Database structure:
/// - snapshots: one entry per collected snapshot
///
/// Key format: 8-byte big-endian timestamp (sign bit flipped so byte order
/// matches numeric order) followed by a 4-byte big-endian sequence number
/// that separates snapshots sharing a timestamp.
/// Value format: JSON serialized `TokenSnapshot`
pub struct LmdbSnapshotStore {
    env: Environment,
    db: Database,
}

impl LmdbSnapshotStore {
    /// Open an existing store in read-only mode
    ///
    /// # Arguments
    /// * `db_path` - Path to the LMDB directory written by the ingest tool
    pub fn open_read_only<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        ensure_exists(db_path)?;

        tracing::info!("Opening LMDB read-only at: {}", db_path.display());

        let env = Environment::new()
            .set_max_dbs(MAX_DBS)
            .set_flags(lmdb::EnvironmentFlags::READ_ONLY)
            .open(db_path)
            .context("Failed to open LMDB environment")?;

        let db = env
            .open_db(Some(SNAPSHOT_DB))
            .context("Failed to open snapshots database")?;

        Ok(Self { env, db })
    }

    /// Open a store for writing, creating the database if needed
    ///
    /// # Arguments
    /// * `db_path` - Existing directory that holds the LMDB files
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        ensure_exists(db_path)?;

        tracing::info!("Opening LMDB read-write at: {}", db_path.display());

        let env = Environment::new()
            .set_max_dbs(MAX_DBS)
            .set_map_size(MAP_SIZE)
            .open(db_path)
            .context("Failed to open LMDB environment")?;

        let db = env
            .create_db(Some(SNAPSHOT_DB), DatabaseFlags::empty())
            .context("Failed to create snapshots database")?;

        Ok(Self { env, db })
    }

    /// Generate the LMDB key for a snapshot
    ///
    /// # Arguments
    /// * `timestamp_ms` - Unix timestamp in milliseconds
    /// * `sequence` - Position among snapshots with the same timestamp
    fn make_key(timestamp_ms: TimestampMS, sequence: u32) -> [u8; 12] {
        let mut key = [0u8; 12];
        key[..8].copy_from_slice(&((timestamp_ms as u64) ^ SIGN_BIT).to_be_bytes());
        key[8..].copy_from_slice(&sequence.to_be_bytes());
        key
    }

    fn key_timestamp(key: &[u8]) -> Result<TimestampMS> {
        let bytes: [u8; 8] = key
            .get(..8)
            .and_then(|prefix| prefix.try_into().ok())
            .ok_or_else(|| anyhow!("Malformed snapshot key ({} bytes)", key.len()))?;
        Ok((u64::from_be_bytes(bytes) ^ SIGN_BIT) as TimestampMS)
    }

    fn decode(value: &[u8]) -> Result<TokenSnapshot> {
        serde_json::from_slice(value).context("Failed to deserialize snapshot JSON")
    }

    /// Append one snapshot; existing entries are never overwritten
    pub fn append(&self, snapshot: &TokenSnapshot) -> Result<()> {
        let value = serde_json::to_vec(snapshot).context("Failed to serialize snapshot")?;
        let mut txn = self
            .env
            .begin_rw_txn()
            .context("Failed to begin write transaction")?;

        let prefix = Self::make_key(snapshot.timestamp, 0);
        let sequence = {
            let cursor = txn
                .open_ro_cursor(self.db)
                .context("Failed to open cursor")?;
            let mut count = 0usize;
            scan_from(&cursor, &prefix, |key, _| {
                if !key.starts_with(&prefix[..8]) {
                    return Ok(false);
                }
                count += 1;
                Ok(true)
            })?;
            count
        };
        let sequence = u32::try_from(sequence)
            .map_err(|_| anyhow!("Too many snapshots at timestamp {}", snapshot.timestamp))?;

        txn.put(
            self.db,
            &Self::make_key(snapshot.timestamp, sequence),
            &value,
            WriteFlags::NO_OVERWRITE,
        )
        .context("Failed to write snapshot")?;
        txn.commit().context("Failed to commit snapshot")?;

        tracing::debug!(
            "Stored snapshot at {} (sequence {})",
            snapshot.timestamp,
            sequence
        );

        Ok(())
    }
}

fn ensure_exists(db_path: &Path) -> Result<()> {
    if !db_path.exists() {
        return Err(anyhow!("LMDB path does not exist: {}", db_path.display()));
    }
    Ok(())
}

/// Walk entries from the first key `>= start` until `visit` returns false
///
/// No key at or after `start` means no entries, not an error.
fn scan_from<'txn, C, F>(cursor: &C, start: &[u8], mut visit: F) -> Result<()>
where
    C: Cursor<'txn>,
    F: FnMut(&'txn [u8], &'txn [u8]) -> Result<bool>,
{
    let mut seek = Some(start);
    let mut op = lmdb_sys::MDB_SET_RANGE;
    loop {
        match cursor.get(seek, None, op) {
            Ok((Some(key), value)) => {
                if !visit(key, value)? {
                    break;
                }
            }
            Ok((None, _)) => return Err(anyhow!("LMDB cursor returned an entry without a key")),
            Err(lmdb::Error::NotFound) => break,
            Err(e) => return Err(anyhow!("LMDB read error: {}", e)),
        }
        seek = None;
        op = lmdb_sys::MDB_NEXT;
    }
    Ok(())
}

impl SnapshotStore for LmdbSnapshotStore {
    fn query_range(&self, start: TimestampMS, end: TimestampMS) -> Result<Vec<TokenSnapshot>> {
        let mut snapshots = Vec::new();
        if start > end {
            return Ok(snapshots);
        }

        let txn = self
            .env
            .begin_ro_txn()
            .context("Failed to begin read transaction")?;
        let cursor = txn.open_ro_cursor(self.db).context("Failed to open cursor")?;

        scan_from(&cursor, &Self::make_key(start, 0), |key, value| {
            if Self::key_timestamp(key)? > end {
                return Ok(false);
            }
            snapshots.push(Self::decode(value)?);
            Ok(true)
        })?;

        tracing::debug!(
            "Found {} snapshots between {} and {}",
            snapshots.len(),
            start,
            end
        );

        Ok(snapshots)
    }

    fn recent(&self, limit: usize) -> Result<Vec<TokenSnapshot>> {
        let txn = self
            .env
            .begin_ro_txn()
            .context("Failed to begin read transaction")?;
        let cursor = txn.open_ro_cursor(self.db).context("Failed to open cursor")?;

        let mut snapshots = Vec::with_capacity(limit.min(1024));
        let mut op = lmdb_sys::MDB_LAST;
        while snapshots.len() < limit {
            match cursor.get(None, None, op) {
                Ok((_, value)) => snapshots.push(Self::decode(value)?),
                Err(lmdb::Error::NotFound) => break,
                Err(e) => return Err(anyhow!("LMDB read error: {}", e)),
            }
            op = lmdb_sys::MDB_PREV;
        }

        snapshots.reverse();
        Ok(snapshots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_orders_like_timestamps() {
        let keys: Vec<_> = [-5_000i64, -1, 0, 1, 1_730_811_225_000]
            .iter()
            .map(|&ts| LmdbSnapshotStore::make_key(ts, 0))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn test_key_round_trips_timestamp() {
        for ts in [i64::MIN, -1, 0, 1_730_811_225_000, i64::MAX] {
            let key = LmdbSnapshotStore::make_key(ts, 7);
            assert_eq!(LmdbSnapshotStore::key_timestamp(&key).unwrap(), ts);
            assert_eq!(&key[8..], &7u32.to_be_bytes());
        }
        assert!(LmdbSnapshotStore::key_timestamp(&[1, 2, 3]).is_err());
    }

    #[test]
    fn test_nonexistent_path() {
        let result = LmdbSnapshotStore::open_read_only("/path/that/does/not/exist");
        assert!(result.is_err());
        assert!(result.err().unwrap().to_string().contains("does not exist"));
    }
}
