use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use stock_core::{
    normalize_ticker, AnalyticsSource, CompanyLookup, ConsolidatedPayload, MarketDataSource,
    Outcome, PurchaseLedger, PurchaseRecord, StockResult,
};

use crate::builder::PayloadBuilder;
use crate::cache::ResultCache;
use crate::purchase::{parse_amount, PurchaseError, PurchaseReceipt};

/// Entry point for the HTTP layer: cached reads and the purchase write path.
pub struct StockService {
    ledger: Arc<dyn PurchaseLedger>,
    market: Arc<dyn MarketDataSource>,
    cache: ResultCache,
}

impl StockService {
    pub fn new(
        ledger: Arc<dyn PurchaseLedger>,
        market: Arc<dyn MarketDataSource>,
        analytics: Arc<dyn AnalyticsSource>,
        cache_ttl: Duration,
    ) -> Self {
        let builder = PayloadBuilder::new(ledger.clone(), market.clone(), analytics);
        Self {
            ledger,
            market,
            cache: ResultCache::new(builder, cache_ttl),
        }
    }

    pub async fn payload(&self, ticker: &str) -> StockResult<(ConsolidatedPayload, Outcome)> {
        self.cache.get_or_build(ticker).await
    }

    /// Validate and store a purchase, then drop the cached payload so the
    /// next read reflects it.
    pub async fn record_purchase(&self, ticker: &str, raw_amount: &Value) -> Result<PurchaseReceipt, PurchaseError> {
        let amount = parse_amount(raw_amount)?;
        let ticker = normalize_ticker(ticker);

        let company_name = match self.ledger.latest_company_name(&ticker).await? {
            Some(name) => name,
            None => match self.market.resolve_company_name(&ticker).await {
                CompanyLookup::Found { name } => name,
                CompanyLookup::NotFound => return Err(PurchaseError::InvalidTicker),
                CompanyLookup::Unavailable { reason } => {
                    tracing::warn!("Cannot validate {} for purchase: {}", ticker, reason);
                    return Err(PurchaseError::UpstreamUnavailable);
                }
            },
        };

        let record = self.ledger.append(&ticker, &company_name, amount).await?;
        self.cache.invalidate(&ticker);

        Ok(PurchaseReceipt::new(record))
    }

    pub async fn purchases(&self, ticker: &str) -> StockResult<Vec<PurchaseRecord>> {
        self.ledger.purchases(&normalize_ticker(ticker)).await
    }
}
