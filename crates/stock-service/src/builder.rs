use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;
use stock_core::{
    normalize_ticker, previous_weekday, AnalyticsSource, CompanyLookup, ConsolidatedPayload,
    MarketDataSource, OhlcRecord, Outcome, PurchaseLedger, PurchasedStatus, StockResult,
    StockSnapshot, StockValues,
};

/// Total OHLC lookups per request, counting the reference date itself.
pub const MAX_OHLC_ATTEMPTS: usize = 5;

pub const MSG_VALIDATION_UNAVAILABLE: &str = "ticker validation service temporarily unavailable";
pub const MSG_INVALID_TICKER: &str = "invalid or unknown ticker";
pub const MSG_NO_OHLC: &str = "could not retrieve recent OHLC data";

/// Assembles the consolidated payload from the ledger, the market data
/// provider and the analytics source. Owns every degrade decision; caching
/// happens one layer up.
pub struct PayloadBuilder {
    ledger: Arc<dyn PurchaseLedger>,
    market: Arc<dyn MarketDataSource>,
    analytics: Arc<dyn AnalyticsSource>,
}

impl PayloadBuilder {
    pub fn new(
        ledger: Arc<dyn PurchaseLedger>,
        market: Arc<dyn MarketDataSource>,
        analytics: Arc<dyn AnalyticsSource>,
    ) -> Self {
        Self { ledger, market, analytics }
    }

    pub async fn build(&self, ticker: &str) -> StockResult<(ConsolidatedPayload, Outcome)> {
        self.build_at(ticker, Utc::now()).await
    }

    /// Same as [`build`](Self::build) with the clock supplied by the caller.
    pub async fn build_at(
        &self,
        ticker: &str,
        now: DateTime<Utc>,
    ) -> StockResult<(ConsolidatedPayload, Outcome)> {
        let ticker = normalize_ticker(ticker);

        let total = self.ledger.sum_amount(&ticker).await?;
        let purchased_status = if total > Decimal::ZERO {
            PurchasedStatus::Purchased
        } else {
            PurchasedStatus::NotPurchased
        };

        let company_name = match self.ledger.latest_company_name(&ticker).await? {
            Some(name) => name,
            None => match self.market.resolve_company_name(&ticker).await {
                CompanyLookup::Found { name } => name,
                CompanyLookup::NotFound => {
                    tracing::info!("Rejected unknown ticker {}", ticker);
                    return Ok((ConsolidatedPayload::error(MSG_INVALID_TICKER), Outcome::InvalidTicker));
                }
                CompanyLookup::Unavailable { reason } => {
                    tracing::warn!("Ticker validation for {} unavailable: {}", ticker, reason);
                    return Ok((
                        ConsolidatedPayload::error(MSG_VALIDATION_UNAVAILABLE),
                        Outcome::ServiceUnavailable,
                    ));
                }
            },
        };

        let Some(ohlc) = self.recent_ohlc(&ticker, now).await else {
            return Ok((ConsolidatedPayload::error(MSG_NO_OHLC), Outcome::DataUnavailable));
        };

        let analytics = self.analytics.fetch(&ticker).await;

        let snapshot = StockSnapshot {
            purchased_amount: total.to_f64().unwrap_or(0.0),
            purchased_status,
            request_date: ohlc.date,
            company_code: ticker,
            company_name,
            stock_values: StockValues {
                open: ohlc.open,
                high: ohlc.high,
                low: ohlc.low,
                close: ohlc.close,
            },
            performance_data: analytics.performance,
            competitors: analytics.competitors,
        };

        Ok((ConsolidatedPayload::Ok(snapshot), Outcome::Success))
    }

    /// Walk back from the reference date until the provider reports a session.
    /// A record without a session date is stamped with the reference date.
    async fn recent_ohlc(&self, ticker: &str, now: DateTime<Utc>) -> Option<OhlcRecord> {
        let reference = self.market.reference_trading_date(now);
        let mut date = reference;

        for attempt in 1..=MAX_OHLC_ATTEMPTS {
            let mut record = self.market.daily_ohlc(ticker, date).await;
            if record.is_ok() {
                if record.date.is_empty() {
                    record.date = reference.format("%Y-%m-%d").to_string();
                }
                return Some(record);
            }

            tracing::debug!(
                "No OHLC for {} on {} ({:?}), attempt {}/{}",
                ticker, date, record.status, attempt, MAX_OHLC_ATTEMPTS
            );
            date = previous_weekday(date);
        }

        tracing::warn!("Gave up on OHLC for {} after {} attempts", ticker, MAX_OHLC_ATTEMPTS);
        None
    }
}
