use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use std::str::FromStr;
use stock_core::{PurchaseRecord, StockError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("amount is required")]
    Missing,

    #[error("amount must be a number")]
    NotANumber,

    #[error("amount must be > 0")]
    NotPositive,

    #[error("amount is out of range")]
    OutOfRange,
}

/// Largest accepted amount (exclusive): 16 integer digits, the width of the
/// stored amount column before its two decimal places.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1874919424, 2328306, 0, false, 0);

#[derive(Error, Debug)]
pub enum PurchaseError {
    #[error(transparent)]
    Amount(#[from] AmountError),

    #[error("invalid or unknown ticker")]
    InvalidTicker,

    #[error("upstream provider unavailable")]
    UpstreamUnavailable,

    #[error(transparent)]
    Ledger(#[from] StockError),
}

/// Confirmation handed back to the caller after a purchase was stored.
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseReceipt {
    pub record: PurchaseRecord,
    pub message: String,
}

impl PurchaseReceipt {
    pub fn new(record: PurchaseRecord) -> Self {
        let message = format!(
            "{} units of stock {} were added to your stock record",
            record.amount, record.ticker
        );
        Self { record, message }
    }
}

/// Validate the raw `amount` field of a purchase request. Accepts JSON numbers
/// and numeric strings; `null` counts as missing.
pub fn parse_amount(raw: &Value) -> Result<Decimal, AmountError> {
    let text = match raw {
        Value::Null => return Err(AmountError::Missing),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return Err(AmountError::NotANumber),
    };

    let amount = match parse_decimal(&text) {
        Some(amount) => amount,
        None => return Err(classify_unrepresentable(&text)),
    };

    if amount <= Decimal::ZERO {
        return Err(AmountError::NotPositive);
    }
    if amount >= MAX_AMOUNT {
        return Err(AmountError::OutOfRange);
    }
    Ok(amount)
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    if text.is_empty() {
        return None;
    }
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

/// Text that is numeric but outside what `Decimal` holds (e.g. `1e30`,
/// `1e-40`) still gets a sign-based answer.
fn classify_unrepresentable(text: &str) -> AmountError {
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() && value <= 0.0 => AmountError::NotPositive,
        Ok(value) if value.is_finite() => AmountError::OutOfRange,
        _ => AmountError::NotANumber,
    }
}
