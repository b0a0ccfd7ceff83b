//! Persisted rate-table cache with TTL support.
//!
//! One JSON file holds one [`CacheRecord`] snapshot. The record is written
//! wholesale on every successful fetch and never mutated in place. Reads
//! and writes follow a "never fail the user flow" contract: a missing or
//! corrupt file is a cache miss, and a failed write is logged and dropped.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Duration;
use obmin_common::{time, RateTable, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Persisted snapshot of a rate table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// When this snapshot was captured.
    pub captured_at: Timestamp,
    /// The rate table at capture time.
    pub table: RateTable,
    /// Publication date reported by the source for this batch.
    pub published_date: String,
}

impl CacheRecord {
    /// Create a record capturing the given table now.
    pub fn new(table: RateTable, published_date: impl Into<String>) -> Self {
        Self {
            captured_at: time::now(),
            table,
            published_date: published_date.into(),
        }
    }

    /// Age of this record.
    pub fn age(&self) -> Duration {
        time::age_of(self.captured_at)
    }
}

/// File-backed single-slot cache for one [`CacheRecord`].
pub struct RateCache {
    path: PathBuf,
    ttl: Duration,
}

impl RateCache {
    /// File name carries a schema suffix; bumping it abandons old snapshots.
    const FILE_NAME: &'static str = "obmin-rates-v1.json";

    /// Create a cache at the given file path with the default TTL.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ttl: time::constants::cache_ttl(),
        }
    }

    /// Create a cache with a custom TTL.
    pub fn with_ttl(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            path: path.into(),
            ttl,
        }
    }

    /// Default cache location under the OS temporary directory.
    pub fn default_path() -> PathBuf {
        std::env::temp_dir().join(Self::FILE_NAME)
    }

    /// The file path this cache reads and writes.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted record, if any.
    ///
    /// Missing, unreadable, or corrupt data is a cache miss, never an
    /// error. Freshness is not checked here; see [`RateCache::is_fresh`].
    pub fn try_load(&self) -> Option<CacheRecord> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "Cache miss");
                return None;
            }
        };

        match serde_json::from_str::<CacheRecord>(&raw) {
            Ok(record) => {
                debug!(
                    path = %self.path.display(),
                    age_minutes = record.age().num_minutes(),
                    "Cache hit"
                );
                Some(record)
            }
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "Corrupt cache treated as miss");
                None
            }
        }
    }

    /// Write a record, replacing any previous snapshot.
    ///
    /// Persistence is a pure optimization: a failed write is logged at
    /// warn level and reported as `false`, never surfaced to the user.
    pub fn try_persist(&self, record: &CacheRecord) -> bool {
        let serialized = match serde_json::to_string(record) {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "Failed to serialize cache record");
                return false;
            }
        };

        match fs::write(&self.path, serialized) {
            Ok(()) => true,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to persist cache record");
                false
            }
        }
    }

    /// True iff the record is younger than this cache's TTL.
    pub fn is_fresh(&self, record: &CacheRecord) -> bool {
        record.age() < self.ttl
    }

    /// Remove the persisted snapshot, if present.
    pub fn clear(&self) {
        let _ = fs::remove_file(&self.path);
    }
}
