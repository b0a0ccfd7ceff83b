//! Authoritative in-memory rate table with persisted-cache mediation.

use obmin_common::{CurrencyCode, RateEntry, RateTable};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use tracing::debug;

use crate::cache::{CacheRecord, RateCache};

#[derive(Debug, Default)]
struct StoreState {
    table: RateTable,
    published_date: String,
}

/// Owns the current rate table and publication date, and mediates all
/// reads and writes to the persisted cache.
///
/// The table is replaced wholesale behind a lock, so a conversion in
/// progress never observes a partially updated table. No component keeps
/// a reference into the table across a refresh; readers get clones.
pub struct RateStore {
    state: RwLock<StoreState>,
    cache: RateCache,
}

impl RateStore {
    /// Create an empty store backed by the given cache.
    pub fn new(cache: RateCache) -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            cache,
        }
    }

    /// Read the persisted cache record, if any. Corrupt data is a miss.
    pub fn try_load_cache(&self) -> Option<CacheRecord> {
        self.cache.try_load()
    }

    /// Best-effort write of a cache record. Failure is logged and dropped.
    pub fn try_persist(&self, record: &CacheRecord) -> bool {
        self.cache.try_persist(record)
    }

    /// True iff the record is within the cache TTL.
    pub fn is_fresh(&self, record: &CacheRecord) -> bool {
        self.cache.is_fresh(record)
    }

    /// Atomically swap the in-memory table and publication date.
    pub fn replace(&self, table: RateTable, published_date: impl Into<String>) {
        let published_date = published_date.into();
        debug!(
            currencies = table.len(),
            published_date = %published_date,
            "Replacing rate table"
        );

        let mut state = self.state.write();
        state.table = table;
        state.published_date = published_date;
    }

    /// All known codes in lexicographic order.
    pub fn codes(&self) -> Vec<CurrencyCode> {
        self.state.read().table.codes()
    }

    /// Look up one entry by code.
    pub fn entry(&self, code: &CurrencyCode) -> Option<RateEntry> {
        self.state.read().table.get(code).cloned()
    }

    /// Look up just the rate for a code.
    pub fn rate(&self, code: &CurrencyCode) -> Option<Decimal> {
        self.state.read().table.get(code).map(|e| e.rate)
    }

    /// Consistent snapshot of the current table.
    pub fn snapshot(&self) -> RateTable {
        self.state.read().table.clone()
    }

    /// Publication date of the current batch. Empty if unknown.
    pub fn published_date(&self) -> String {
        self.state.read().published_date.clone()
    }

    /// True while no table has been adopted.
    pub fn is_empty(&self) -> bool {
        self.state.read().table.is_empty()
    }
}
