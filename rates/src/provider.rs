//! Rate provider traits and the NBU HTTP implementation.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use tracing::debug;

use crate::error::{RatesError, RatesResult};

/// One row of the source's current rate list, as received.
///
/// Every field is optional: rows missing a code or a parseable rate are
/// skipped during normalization rather than failing the whole batch.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRate {
    /// Currency code field.
    #[serde(rename = "cc", default)]
    pub code: Option<String>,
    /// Rate field; the source may send a number or a numeric string.
    #[serde(rename = "rate", default)]
    pub rate: Option<RawNumber>,
    /// Display text field.
    #[serde(rename = "txt", default)]
    pub display_name: Option<String>,
    /// Per-row publication date.
    #[serde(rename = "exchangedate", default)]
    pub published_date: Option<String>,
}

impl RawRate {
    /// Build a row by hand (used by tests and the mock provider).
    pub fn new(
        code: impl Into<String>,
        rate: impl Into<String>,
        display_name: impl Into<String>,
        published_date: impl Into<String>,
    ) -> Self {
        Self {
            code: Some(code.into()),
            rate: Some(RawNumber::Text(rate.into())),
            display_name: Some(display_name.into()),
            published_date: Some(published_date.into()),
        }
    }

    /// Parse the rate field into a finite positive decimal, if possible.
    ///
    /// Accepts both `.` and `,` as decimal separator in string form.
    pub fn parsed_rate(&self) -> Option<Decimal> {
        let rate = match self.rate.as_ref()? {
            RawNumber::Number(v) => {
                if !v.is_finite() {
                    return None;
                }
                Decimal::try_from(*v).ok()?
            }
            RawNumber::Text(s) => Decimal::from_str(&s.trim().replace(',', ".")).ok()?,
        };

        if rate > Decimal::ZERO {
            Some(rate)
        } else {
            None
        }
    }
}

/// A numeric field that may arrive as a JSON number or a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    Number(f64),
    Text(String),
}

/// Trait for exchange-rate sources.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &str;

    /// Fetch the source's current rate list.
    async fn fetch_rates(&self) -> RatesResult<Vec<RawRate>>;
}

/// National Bank of Ukraine daily exchange-rate endpoint.
pub struct NbuProvider {
    client: reqwest::Client,
    endpoint: String,
}

impl NbuProvider {
    /// The fixed endpoint returning the current daily rate list as JSON.
    pub const DEFAULT_ENDPOINT: &'static str =
        "https://bank.gov.ua/NBUStatService/v1/statdirectory/exchange?json";

    /// Create a provider against the default endpoint.
    pub fn new() -> RatesResult<Self> {
        Self::with_endpoint(Self::DEFAULT_ENDPOINT)
    }

    /// Create a provider against a custom endpoint (useful for tests and
    /// mirrors).
    pub fn with_endpoint(endpoint: impl Into<String>) -> RatesResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(obmin_common::time::constants::fetch_timeout())
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl RateProvider for NbuProvider {
    fn name(&self) -> &str {
        "NBU"
    }

    async fn fetch_rates(&self) -> RatesResult<Vec<RawRate>> {
        debug!(endpoint = %self.endpoint, "Fetching exchange rates");

        let response = self.client.get(&self.endpoint).send().await?;

        if !response.status().is_success() {
            return Err(RatesError::NetworkFailure(format!(
                "unexpected status {}",
                response.status()
            )));
        }

        response
            .json::<Vec<RawRate>>()
            .await
            .map_err(|e| RatesError::MalformedResponse(e.to_string()))
    }
}

/// Mock rate provider for testing the loader's fallback chain.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockRateProvider {
    name: String,
    rows: parking_lot::Mutex<Option<Vec<RawRate>>>,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockRateProvider {
    /// Create a mock that fails every fetch.
    pub fn failing(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: parking_lot::Mutex::new(None),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Create a mock that returns the given rows.
    pub fn with_rows(name: impl Into<String>, rows: Vec<RawRate>) -> Self {
        Self {
            name: name.into(),
            rows: parking_lot::Mutex::new(Some(rows)),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Number of fetch attempts made against this mock.
    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl RateProvider for MockRateProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_rates(&self) -> RatesResult<Vec<RawRate>> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        match self.rows.lock().clone() {
            Some(rows) => Ok(rows),
            None => Err(RatesError::NetworkFailure("mock provider offline".into())),
        }
    }
}
