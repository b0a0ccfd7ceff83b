//! Converter error types.

use obmin_common::CurrencyCode;
use thiserror::Error;

/// Errors that can occur while loading rates or computing conversions.
///
/// Loader-level failures (`NetworkFailure`, `MalformedResponse`) are
/// absorbed by the fallback chain and only logged; the terminal
/// `NoDataAvailable` is the single loader error that reaches the caller.
/// Cache-write failures never appear here at all — persistence is
/// best-effort and swallowed at the cache layer.
#[derive(Debug, Error)]
pub enum RatesError {
    /// The rate fetch failed at the transport level.
    #[error("Network failure: {0}")]
    NetworkFailure(String),

    /// The rate source responded, but the payload was unusable.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// No network success and no cache of any age.
    #[error("No exchange-rate data available")]
    NoDataAvailable,

    /// Blank amount input.
    #[error("Amount is empty")]
    EmptyAmount,

    /// Amount input that is not a finite non-negative number.
    #[error("Invalid amount: {0:?}")]
    InvalidAmount(String),

    /// Currency code absent from the current rate table.
    #[error("Unknown currency: {0}")]
    UnknownCurrency(CurrencyCode),
}

impl From<reqwest::Error> for RatesError {
    fn from(value: reqwest::Error) -> Self {
        Self::NetworkFailure(value.to_string())
    }
}

/// Result type for converter operations.
pub type RatesResult<T> = Result<T, RatesError>;
