//! Time utilities and constants for the obmin converter.

use chrono::{DateTime, Duration, Utc};

/// Converter timing constants.
pub mod constants {
    use super::Duration;

    /// Maximum age after which a cached rate table is no longer trusted
    /// without revalidation (12 hours).
    pub fn cache_ttl() -> Duration {
        Duration::hours(12)
    }

    /// Quiet window for debounced auto-recalculation (180 milliseconds).
    pub fn debounce_window() -> std::time::Duration {
        std::time::Duration::from_millis(180)
    }

    /// Explicit timeout on the exchange-rate fetch (10 seconds), so a
    /// stalled request cannot hang the fallback chain.
    pub fn fetch_timeout() -> std::time::Duration {
        std::time::Duration::from_secs(10)
    }
}

/// A timestamp with timezone (always UTC for obmin).
pub type Timestamp = DateTime<Utc>;

/// Get the current timestamp.
pub fn now() -> Timestamp {
    Utc::now()
}

/// Age of a timestamp relative to now. Negative for future timestamps.
pub fn age_of(timestamp: Timestamp) -> Duration {
    now().signed_duration_since(timestamp)
}
