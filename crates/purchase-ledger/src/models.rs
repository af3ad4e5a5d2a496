use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;
use stock_core::{PurchaseRecord, StockError};

/// Row as stored. Amounts are kept as decimal text so no precision is lost.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PurchaseRow {
    pub id: i64,
    pub ticker: String,
    pub company_name: String,
    pub amount: String,
    pub created_at: DateTime<Utc>,
}

pub(crate) fn parse_amount(raw: &str) -> Result<Decimal, StockError> {
    Decimal::from_str(raw).map_err(|e| StockError::InvalidData(format!("stored amount {:?}: {}", raw, e)))
}

impl TryFrom<PurchaseRow> for PurchaseRecord {
    type Error = StockError;

    fn try_from(row: PurchaseRow) -> Result<Self, Self::Error> {
        Ok(PurchaseRecord {
            id: row.id,
            amount: parse_amount(&row.amount)?,
            ticker: row.ticker,
            company_name: row.company_name,
            created_at: row.created_at,
        })
    }
}
