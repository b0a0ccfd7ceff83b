//! Currency and rate-table types for the obmin converter.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Display name used for the synthetic base-currency entry.
pub const BASE_DISPLAY_NAME: &str = "Українська гривня";

/// ISO 4217 currency code, canonicalized to uppercase at construction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Create a new currency code from a raw string.
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_uppercase())
    }

    /// Get the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether the code is empty (e.g. parsed from a blank field).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The base currency all rates are relative to.
    pub fn uah() -> Self {
        Self::new("UAH")
    }

    /// Common currencies
    pub fn usd() -> Self {
        Self::new("USD")
    }

    pub fn eur() -> Self {
        Self::new("EUR")
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CurrencyCode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// One currency's exchange data.
///
/// `rate` is expressed as units of the base currency per 1 unit of this
/// currency. The base currency itself carries a fixed entry with rate 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateEntry {
    /// Currency identifier, unique key within a table.
    pub code: CurrencyCode,
    /// Units of base currency per 1 unit of this currency. Always positive.
    pub rate: Decimal,
    /// Human-readable name for UI labeling.
    pub display_name: String,
    /// Date this rate batch was issued by the source. Empty if unknown.
    pub published_date: String,
}

impl RateEntry {
    /// Create a new rate entry.
    pub fn new(
        code: CurrencyCode,
        rate: Decimal,
        display_name: impl Into<String>,
        published_date: impl Into<String>,
    ) -> Self {
        Self {
            code,
            rate,
            display_name: display_name.into(),
            published_date: published_date.into(),
        }
    }

    /// The synthetic base-currency entry with a fixed rate of 1.
    pub fn base() -> Self {
        Self {
            code: CurrencyCode::uah(),
            rate: Decimal::ONE,
            display_name: BASE_DISPLAY_NAME.to_string(),
            published_date: String::new(),
        }
    }
}

/// Snapshot of all known currency codes mapped to their rate data.
///
/// Keys are unique; iteration order is lexicographic by code, which is the
/// order UI selectors are populated in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    entries: BTreeMap<CurrencyCode, RateEntry>,
}

impl RateTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table pre-seeded with the base-currency entry.
    pub fn with_base() -> Self {
        let mut table = Self::new();
        table.upsert(RateEntry::base());
        table
    }

    /// Insert or replace an entry, keyed by its code.
    pub fn upsert(&mut self, entry: RateEntry) {
        self.entries.insert(entry.code.clone(), entry);
    }

    /// Look up an entry by code.
    pub fn get(&self, code: &CurrencyCode) -> Option<&RateEntry> {
        self.entries.get(code)
    }

    /// Check whether a code is present.
    pub fn contains(&self, code: &CurrencyCode) -> bool {
        self.entries.contains_key(code)
    }

    /// All codes in lexicographic order.
    pub fn codes(&self) -> Vec<CurrencyCode> {
        self.entries.keys().cloned().collect()
    }

    /// Iterate entries in lexicographic code order.
    pub fn iter(&self) -> impl Iterator<Item = &RateEntry> {
        self.entries.values()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_code_canonicalization() {
        assert_eq!(CurrencyCode::new(" usd ").as_str(), "USD");
        assert_eq!(CurrencyCode::new("Eur"), CurrencyCode::eur());
    }

    #[test]
    fn test_base_entry() {
        let base = RateEntry::base();
        assert_eq!(base.code, CurrencyCode::uah());
        assert_eq!(base.rate, Decimal::ONE);
        assert!(base.published_date.is_empty());
    }

    #[test]
    fn test_table_upsert_replaces() {
        let mut table = RateTable::new();
        table.upsert(RateEntry::new(CurrencyCode::usd(), dec!(41.0), "US Dollar", ""));
        table.upsert(RateEntry::new(CurrencyCode::usd(), dec!(41.5), "US Dollar", ""));

        assert_eq!(table.len(), 1);
        assert_eq!(table.get(&CurrencyCode::usd()).unwrap().rate, dec!(41.5));
    }

    #[test]
    fn test_codes_sorted_lexicographically() {
        let mut table = RateTable::with_base();
        table.upsert(RateEntry::new(CurrencyCode::usd(), dec!(41.5), "US Dollar", ""));
        table.upsert(RateEntry::new(CurrencyCode::eur(), dec!(45.0), "Euro", ""));

        let codes: Vec<String> = table.codes().iter().map(|c| c.as_str().to_string()).collect();
        assert_eq!(codes, vec!["EUR", "UAH", "USD"]);
    }
}
