use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Canonical form of a ticker: trimmed and uppercased.
pub fn normalize_ticker(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

/// A single recorded purchase. Rows are append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    pub id: i64,
    pub ticker: String,
    pub company_name: String,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Outcome of a company-name lookup against the market data provider.
///
/// `Unavailable` (the provider could not be reached or answered garbage) must
/// never be treated like `NotFound` (the provider says the ticker does not exist).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompanyLookup {
    Found { name: String },
    NotFound,
    Unavailable { reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OhlcStatus {
    Ok,
    /// Upstream answered with a non-OK status, e.g. a non-trading day.
    InvalidDate,
    /// Transport or decoding fault.
    Error,
}

/// One day's open/high/low/close as reported by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcRecord {
    pub status: OhlcStatus,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub date: String,
    pub symbol: String,
    pub error_message: Option<String>,
}

impl OhlcRecord {
    pub fn invalid_date(symbol: &str, date: &str) -> Self {
        Self {
            status: OhlcStatus::InvalidDate,
            open: None,
            high: None,
            low: None,
            close: None,
            date: date.to_string(),
            symbol: symbol.to_string(),
            error_message: None,
        }
    }

    pub fn error(symbol: &str, date: &str, message: impl Into<String>) -> Self {
        Self {
            status: OhlcStatus::Error,
            error_message: Some(message.into()),
            ..Self::invalid_date(symbol, date)
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == OhlcStatus::Ok
    }
}

/// Trailing performance percentages scraped from the analytics page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceData {
    pub five_days: Option<f64>,
    pub one_month: Option<f64>,
    pub three_months: Option<f64>,
    pub year_to_date: Option<f64>,
    pub one_year: Option<f64>,
}

impl PerformanceData {
    /// Assign a value by its page label ("5 Day", "1 Month", ...).
    /// Returns false for labels outside the five tracked periods.
    pub fn set_by_label(&mut self, label: &str, value: Option<f64>) -> bool {
        let slot = match label {
            "5 Day" => &mut self.five_days,
            "1 Month" => &mut self.one_month,
            "3 Month" => &mut self.three_months,
            "YTD" => &mut self.year_to_date,
            "1 Year" => &mut self.one_year,
            _ => return false,
        };
        *slot = value;
        true
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketCap {
    pub currency: Option<String>,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Competitor {
    pub name: String,
    pub market_cap: MarketCap,
}

/// Best-effort analytics for a ticker. The default value is the degraded shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSnapshot {
    pub performance: PerformanceData,
    pub competitors: Vec<Competitor>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockValues {
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PurchasedStatus {
    #[serde(rename = "purchased")]
    Purchased,
    #[serde(rename = "none")]
    NotPurchased,
}

/// Body of a successful payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockSnapshot {
    pub purchased_amount: f64,
    pub purchased_status: PurchasedStatus,
    pub request_date: String,
    pub company_code: String,
    pub company_name: String,
    pub stock_values: StockValues,
    pub performance_data: PerformanceData,
    pub competitors: Vec<Competitor>,
}

/// The consolidated read payload. Serializes as `{"status":"ok", ...}` or
/// `{"status":"error","error":"..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ConsolidatedPayload {
    Ok(StockSnapshot),
    Error { error: String },
}

impl ConsolidatedPayload {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }

    pub fn snapshot(&self) -> Option<&StockSnapshot> {
        match self {
            Self::Ok(snapshot) => Some(snapshot),
            Self::Error { .. } => None,
        }
    }
}

/// How a payload build ended. Mirrors the HTTP status the caller should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Success,
    InvalidTicker,
    ServiceUnavailable,
    DataUnavailable,
}

impl Outcome {
    pub fn is_success(self) -> bool {
        self == Outcome::Success
    }

    pub fn http_status(self) -> u16 {
        match self {
            Outcome::Success => 200,
            Outcome::InvalidTicker => 400,
            Outcome::ServiceUnavailable | Outcome::DataUnavailable => 503,
        }
    }
}
