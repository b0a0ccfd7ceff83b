//! Conversion engine: validated conversion through the base currency.

use std::str::FromStr;
use std::sync::Arc;

use obmin_common::CurrencyCode;
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::{RatesError, RatesResult};
use crate::store::RateStore;

/// Ephemeral conversion input. Both codes must exist in the current table.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    /// Amount to convert. Finite and non-negative.
    pub amount: Decimal,
    /// Currency to convert from.
    pub from: CurrencyCode,
    /// Currency to convert to.
    pub to: CurrencyCode,
}

impl ConversionRequest {
    /// Create a new conversion request.
    pub fn new(amount: Decimal, from: CurrencyCode, to: CurrencyCode) -> Self {
        Self { amount, from, to }
    }
}

/// Ephemeral conversion output. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionResult {
    /// The input amount.
    pub amount: Decimal,
    /// Currency converted from.
    pub from: CurrencyCode,
    /// Currency converted to.
    pub to: CurrencyCode,
    /// `amount * rate_from / rate_to`.
    pub converted: Decimal,
    /// Units of base currency per 1 unit of `from`.
    pub rate_from: Decimal,
    /// Units of base currency per 1 unit of `to`.
    pub rate_to: Decimal,
}

impl ConversionResult {
    /// Human-readable derivation trail: both unit rates and the arithmetic
    /// expression. For display purposes only; number formatting beyond
    /// this is the display layer's concern.
    pub fn trail(&self) -> Vec<String> {
        let base = CurrencyCode::uah();
        vec![
            format!("1 {} = {} {}", self.from, self.rate_from, base),
            format!("1 {} = {} {}", self.to, self.rate_to, base),
            format!(
                "{} × {} / {} = {}",
                self.amount, self.rate_from, self.rate_to, self.converted
            ),
        ]
    }
}

/// Computes a single conversion against the store's current table.
///
/// Errors are returned as distinct outcomes and never panic or leave the
/// store in a broken state; the caller decides whether to surface or
/// suppress them.
pub struct ConversionEngine {
    store: Arc<RateStore>,
}

impl ConversionEngine {
    /// Create an engine over the given store.
    pub fn new(store: Arc<RateStore>) -> Self {
        Self { store }
    }

    /// Parse user-entered amount text.
    ///
    /// Accepts both `.` and `,` as decimal separator. Blank input is
    /// [`RatesError::EmptyAmount`], distinct from the not-a-number case.
    pub fn parse_amount(raw: &str) -> RatesResult<Decimal> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(RatesError::EmptyAmount);
        }

        let amount = Decimal::from_str(&trimmed.replace(',', "."))
            .map_err(|_| RatesError::InvalidAmount(raw.to_string()))?;

        if amount.is_sign_negative() {
            return Err(RatesError::InvalidAmount(raw.to_string()));
        }

        Ok(amount)
    }

    /// Convert an already-validated request.
    pub fn convert(&self, request: &ConversionRequest) -> RatesResult<ConversionResult> {
        // One consistent snapshot for both lookups; a concurrent table
        // swap cannot split the pair across two batches.
        let table = self.store.snapshot();

        let rate_from = table
            .get(&request.from)
            .map(|e| e.rate)
            .ok_or_else(|| RatesError::UnknownCurrency(request.from.clone()))?;
        let rate_to = table
            .get(&request.to)
            .map(|e| e.rate)
            .ok_or_else(|| RatesError::UnknownCurrency(request.to.clone()))?;

        // Checked arithmetic: an overflowing amount (or a zero rate from a
        // hand-edited cache record) must surface as an error outcome, never
        // a panic.
        let converted = request
            .amount
            .checked_mul(rate_from)
            .and_then(|amount_in_base| amount_in_base.checked_div(rate_to))
            .ok_or_else(|| RatesError::InvalidAmount(request.amount.to_string()))?;

        debug!(
            from = %request.from,
            to = %request.to,
            amount = %request.amount,
            converted = %converted,
            "Conversion computed"
        );

        Ok(ConversionResult {
            amount: request.amount,
            from: request.from.clone(),
            to: request.to.clone(),
            converted,
            rate_from,
            rate_to,
        })
    }

    /// Parse amount text and convert in one step.
    pub fn convert_text(
        &self,
        raw_amount: &str,
        from: CurrencyCode,
        to: CurrencyCode,
    ) -> RatesResult<ConversionResult> {
        let amount = Self::parse_amount(raw_amount)?;
        self.convert(&ConversionRequest::new(amount, from, to))
    }
}
