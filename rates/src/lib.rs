//! Obmin Rates Engine
//!
//! Exchange-rate resolution and currency conversion against the hryvnia
//! base, backed by the National Bank of Ukraine daily rate list.
//!
//! # Features
//!
//! - Three-tier rate resolution: fresh persisted cache, live fetch,
//!   stale cache as last resort
//! - Time-boxed persistent caching (12-hour TTL, best-effort writes)
//! - Validated conversion through the base currency with a derivation
//!   trail for display
//! - A single-slot cancellable debounce primitive for auto-recalculation
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use obmin_common::CurrencyCode;
//! use obmin_rates::{ConversionEngine, NbuProvider, RateCache, RateLoader, RateStore};
//!
//! let store = Arc::new(RateStore::new(RateCache::new(RateCache::default_path())));
//! let loader = RateLoader::new(Arc::new(NbuProvider::new()?));
//! loader.load(&store).await?;
//!
//! let engine = ConversionEngine::new(store);
//! let result = engine.convert_text("100", CurrencyCode::eur(), CurrencyCode::usd())?;
//! ```

pub mod cache;
pub mod convert;
pub mod debounce;
pub mod error;
pub mod loader;
pub mod provider;
pub mod store;

pub use cache::{CacheRecord, RateCache};
pub use convert::{ConversionEngine, ConversionRequest, ConversionResult};
pub use debounce::Debouncer;
pub use error::{RatesError, RatesResult};
pub use loader::{normalize, LoadOutcome, RateLoader};
pub use provider::{NbuProvider, RateProvider, RawRate};
pub use store::RateStore;
