use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::{AnalyticsSnapshot, CompanyLookup, OhlcRecord, PurchaseRecord, StockResult};

/// Upstream market data provider (company reference data and daily bars)
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn resolve_company_name(&self, ticker: &str) -> CompanyLookup;

    async fn daily_ohlc(&self, ticker: &str, date: NaiveDate) -> OhlcRecord;

    fn reference_trading_date(&self, now: DateTime<Utc>) -> NaiveDate {
        crate::calendar::reference_trading_date(now)
    }
}

/// Best-effort analytics source. Implementations must not fail; they return
/// `AnalyticsSnapshot::default()` when nothing could be extracted.
#[async_trait]
pub trait AnalyticsSource: Send + Sync {
    async fn fetch(&self, ticker: &str) -> AnalyticsSnapshot;
}

/// Append-only purchase ledger
#[async_trait]
pub trait PurchaseLedger: Send + Sync {
    /// Sum of all purchase amounts for the ticker, zero when there are none.
    async fn sum_amount(&self, ticker: &str) -> StockResult<Decimal>;

    /// Most recently recorded non-empty company name for the ticker.
    async fn latest_company_name(&self, ticker: &str) -> StockResult<Option<String>>;

    async fn append(&self, ticker: &str, company_name: &str, amount: Decimal) -> StockResult<PurchaseRecord>;

    /// All purchases for the ticker, newest first.
    async fn purchases(&self, ticker: &str) -> StockResult<Vec<PurchaseRecord>>;
}
