//! Three-tier rate resolution: fresh cache, network, stale cache.

use std::sync::Arc;

use obmin_common::RateTable;
use tracing::{debug, info, warn};

use crate::cache::CacheRecord;
use crate::error::{RatesError, RatesResult};
use crate::provider::{RateProvider, RawRate};
use crate::store::RateStore;

/// Which tier satisfied a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Adopted a persisted cache within its TTL; no network call made.
    FreshCache,
    /// Fetched live rates and refreshed the cache.
    Network,
    /// Network failed; adopted a persisted cache past its TTL.
    StaleCache,
}

impl LoadOutcome {
    /// Whether the adopted data may be out of date.
    pub fn is_possibly_stale(&self) -> bool {
        matches!(self, LoadOutcome::StaleCache)
    }
}

/// Populates a [`RateStore`] using strict, short-circuiting precedence:
/// fresh persisted cache, then a live fetch, then any persisted cache as a
/// last resort. Called once at startup.
///
/// Network and parsing failures never propagate; they are absorbed by the
/// fallback chain. Only total unavailability (no network success and no
/// cache of any age) is reported as [`RatesError::NoDataAvailable`].
pub struct RateLoader {
    provider: Arc<dyn RateProvider>,
}

impl RateLoader {
    /// Create a loader over the given provider.
    pub fn new(provider: Arc<dyn RateProvider>) -> Self {
        Self { provider }
    }

    /// Resolve the store's contents.
    pub async fn load(&self, store: &RateStore) -> RatesResult<LoadOutcome> {
        // Tier 1: a fresh persisted cache short-circuits the network.
        let cached = store.try_load_cache();
        if let Some(record) = &cached {
            if store.is_fresh(record) {
                info!(
                    age_minutes = record.age().num_minutes(),
                    "Adopting fresh cached rates"
                );
                store.replace(record.table.clone(), record.published_date.clone());
                return Ok(LoadOutcome::FreshCache);
            }
            debug!(
                age_minutes = record.age().num_minutes(),
                "Persisted cache is stale, trying network"
            );
        }

        // Tier 2: live fetch; refreshes the cache on success.
        match self.fetch_and_normalize().await {
            Ok((table, published_date)) => {
                let record = CacheRecord::new(table.clone(), published_date.clone());
                store.replace(table, published_date);
                store.try_persist(&record);
                info!(
                    provider = self.provider.name(),
                    currencies = record.table.len(),
                    "Adopted live rates"
                );
                return Ok(LoadOutcome::Network);
            }
            Err(e) => {
                warn!(provider = self.provider.name(), error = %e, "Rate fetch failed");
            }
        }

        // Tier 3: any persisted cache, stale included.
        if let Some(record) = cached {
            warn!(
                age_minutes = record.age().num_minutes(),
                "Using cached, possibly stale exchange rates"
            );
            store.replace(record.table, record.published_date);
            return Ok(LoadOutcome::StaleCache);
        }

        warn!("Exchange-rate data unavailable");
        Err(RatesError::NoDataAvailable)
    }

    async fn fetch_and_normalize(&self) -> RatesResult<(RateTable, String)> {
        let rows = self.provider.fetch_rates().await?;
        let (table, published_date) = normalize(rows);

        // A payload with no usable rows leaves only the synthetic base
        // entry, which is as good as no payload at all.
        if table.len() <= 1 {
            return Err(RatesError::MalformedResponse(
                "no usable rates in payload".into(),
            ));
        }

        Ok((table, published_date))
    }
}

/// Normalize a raw rate list into a table keyed by uppercased code.
///
/// The base-currency entry is always synthesized with rate 1. Rows lacking
/// a code or a finite positive rate are skipped; display text falls back
/// to the code itself. The batch publication date is taken from the first
/// row that carries one, in source order.
pub fn normalize(rows: Vec<RawRate>) -> (RateTable, String) {
    use obmin_common::{CurrencyCode, RateEntry};

    let mut table = RateTable::with_base();
    let mut batch_date = String::new();

    for row in rows {
        let row_date = row.published_date.clone().unwrap_or_default();
        if batch_date.is_empty() && !row_date.is_empty() {
            batch_date = row_date.clone();
        }

        let code = match row.code.as_deref() {
            Some(raw) => {
                let code = CurrencyCode::new(raw);
                if code.is_empty() {
                    continue;
                }
                code
            }
            None => continue,
        };

        let rate = match row.parsed_rate() {
            Some(rate) => rate,
            None => {
                debug!(code = %code, "Skipping row without a usable rate");
                continue;
            }
        };

        let display_name = match row.display_name {
            Some(name) if !name.trim().is_empty() => name,
            _ => code.as_str().to_string(),
        };

        table.upsert(RateEntry::new(code, rate, display_name, row_date));
    }

    (table, batch_date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::RateCache;
    use crate::provider::MockRateProvider;
    use chrono::Duration;
    use obmin_common::{time, CurrencyCode};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::path::PathBuf;

    fn temp_path() -> PathBuf {
        std::env::temp_dir().join(format!("obmin-loader-test-{}.json", uuid::Uuid::new_v4()))
    }

    fn sample_rows() -> Vec<RawRate> {
        vec![
            RawRate::new("USD", "41.5", "Долар США", "30.08.2026"),
            RawRate::new("EUR", "45.0", "Євро", "30.08.2026"),
        ]
    }

    fn record_aged(hours: i64) -> CacheRecord {
        let (table, published_date) = normalize(sample_rows());
        CacheRecord {
            captured_at: time::now() - Duration::hours(hours),
            table,
            published_date,
        }
    }

    #[tokio::test]
    async fn test_fresh_cache_short_circuits_network() {
        let cache = RateCache::new(temp_path());
        cache.try_persist(&record_aged(1));
        let store = RateStore::new(cache);

        let provider = Arc::new(MockRateProvider::with_rows("mock", sample_rows()));
        let loader = RateLoader::new(provider.clone());

        let outcome = loader.load(&store).await.unwrap();

        assert_eq!(outcome, LoadOutcome::FreshCache);
        assert_eq!(provider.calls(), 0);
        assert_eq!(store.rate(&CurrencyCode::usd()), Some(dec!(41.5)));
    }

    #[tokio::test]
    async fn test_network_success_refreshes_cache() {
        let cache = RateCache::new(temp_path());
        let store = RateStore::new(cache);

        let provider = Arc::new(MockRateProvider::with_rows("mock", sample_rows()));
        let loader = RateLoader::new(provider.clone());

        let outcome = loader.load(&store).await.unwrap();

        assert_eq!(outcome, LoadOutcome::Network);
        assert_eq!(provider.calls(), 1);
        assert_eq!(store.published_date(), "30.08.2026");

        // The fetch left a fresh cache record behind.
        let persisted = store.try_load_cache().unwrap();
        assert!(store.is_fresh(&persisted));
        assert!(persisted.table.contains(&CurrencyCode::eur()));
    }

    #[tokio::test]
    async fn test_stale_cache_adopted_when_network_fails() {
        let cache = RateCache::new(temp_path());
        cache.try_persist(&record_aged(13));
        let store = RateStore::new(cache);

        let provider = Arc::new(MockRateProvider::failing("mock"));
        let loader = RateLoader::new(provider.clone());

        let outcome = loader.load(&store).await.unwrap();

        assert_eq!(outcome, LoadOutcome::StaleCache);
        assert!(outcome.is_possibly_stale());
        assert_eq!(provider.calls(), 1);
        assert_eq!(store.rate(&CurrencyCode::eur()), Some(dec!(45.0)));
    }

    #[tokio::test]
    async fn test_total_failure_leaves_store_empty() {
        let store = RateStore::new(RateCache::new(temp_path()));

        let provider = Arc::new(MockRateProvider::failing("mock"));
        let loader = RateLoader::new(provider);

        let result = loader.load(&store).await;

        assert!(matches!(result, Err(RatesError::NoDataAvailable)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_empty_payload_falls_through_to_stale_cache() {
        let cache = RateCache::new(temp_path());
        cache.try_persist(&record_aged(13));
        let store = RateStore::new(cache);

        let provider = Arc::new(MockRateProvider::with_rows("mock", vec![]));
        let loader = RateLoader::new(provider);

        let outcome = loader.load(&store).await.unwrap();
        assert_eq!(outcome, LoadOutcome::StaleCache);
    }

    #[test]
    fn test_normalize_synthesizes_base_entry() {
        let (table, _) = normalize(vec![]);

        let base = table.get(&CurrencyCode::uah()).unwrap();
        assert_eq!(base.rate, Decimal::ONE);
        assert!(base.published_date.is_empty());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_normalize_skips_unusable_rows() {
        let rows = vec![
            RawRate::new("USD", "41.5", "Долар США", "30.08.2026"),
            RawRate::new("", "9.9", "Blank code", "30.08.2026"),
            RawRate::new("XXX", "garbage", "Bad rate", "30.08.2026"),
            RawRate {
                rate: None,
                ..RawRate::new("YYY", "1", "No rate", "")
            },
        ];

        let (table, _) = normalize(rows);

        // Base plus the one valid row.
        assert_eq!(table.len(), 2);
        assert!(table.contains(&CurrencyCode::usd()));
    }

    #[test]
    fn test_normalize_uppercases_and_falls_back_to_code() {
        let rows = vec![RawRate {
            code: Some("usd".into()),
            rate: Some(crate::provider::RawNumber::Text("41.5".into())),
            display_name: None,
            published_date: None,
        }];

        let (table, _) = normalize(rows);

        let entry = table.get(&CurrencyCode::usd()).unwrap();
        assert_eq!(entry.display_name, "USD");
    }

    #[test]
    fn test_normalize_takes_first_published_date() {
        let rows = vec![
            RawRate::new("AAA", "garbage", "", ""),
            RawRate::new("USD", "41.5", "", "29.08.2026"),
            RawRate::new("EUR", "45.0", "", "30.08.2026"),
        ];

        let (_, batch_date) = normalize(rows);
        assert_eq!(batch_date, "29.08.2026");
    }
}
