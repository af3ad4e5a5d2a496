use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use stock_core::{normalize_ticker, PurchaseLedger, PurchaseRecord, StockError, StockResult};

use crate::db::{db_err, LedgerDb};
use crate::models::{parse_amount, PurchaseRow};

/// SQLite-backed purchase ledger. Rows are only ever inserted.
#[derive(Clone)]
pub struct SqliteLedger {
    db: LedgerDb,
}

impl SqliteLedger {
    pub fn new(db: LedgerDb) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PurchaseLedger for SqliteLedger {
    async fn sum_amount(&self, ticker: &str) -> StockResult<Decimal> {
        // Summed in Rust: SQLite would coerce the decimal text to REAL.
        let amounts: Vec<String> = sqlx::query_scalar("SELECT amount FROM purchases WHERE ticker = ?")
            .bind(normalize_ticker(ticker))
            .fetch_all(self.db.pool())
            .await
            .map_err(db_err)?;

        amounts.iter().try_fold(Decimal::ZERO, |total, raw| {
            total.checked_add(parse_amount(raw)?).ok_or_else(|| {
                StockError::InvalidData(format!("purchase total for {} overflows", normalize_ticker(ticker)))
            })
        })
    }

    async fn latest_company_name(&self, ticker: &str) -> StockResult<Option<String>> {
        sqlx::query_scalar(
            r#"
            SELECT company_name FROM purchases
            WHERE ticker = ? AND TRIM(company_name) <> ''
            ORDER BY id DESC
            LIMIT 1
            "#
        )
        .bind(normalize_ticker(ticker))
        .fetch_optional(self.db.pool())
        .await
        .map_err(db_err)
    }

    async fn append(&self, ticker: &str, company_name: &str, amount: Decimal) -> StockResult<PurchaseRecord> {
        let ticker = normalize_ticker(ticker);
        let created_at = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO purchases (ticker, company_name, amount, created_at)
            VALUES (?, ?, ?, ?)
            "#
        )
        .bind(&ticker)
        .bind(company_name)
        .bind(amount.to_string())
        .bind(created_at)
        .execute(self.db.pool())
        .await
        .map_err(db_err)?;

        let record = PurchaseRecord {
            id: result.last_insert_rowid(),
            ticker,
            company_name: company_name.to_string(),
            amount,
            created_at,
        };
        tracing::info!("Recorded purchase #{} of {} {}", record.id, record.amount, record.ticker);
        Ok(record)
    }

    async fn purchases(&self, ticker: &str) -> StockResult<Vec<PurchaseRecord>> {
        let rows = sqlx::query_as::<_, PurchaseRow>(
            "SELECT id, ticker, company_name, amount, created_at FROM purchases WHERE ticker = ? ORDER BY id DESC"
        )
        .bind(normalize_ticker(ticker))
        .fetch_all(self.db.pool())
        .await
        .map_err(db_err)?;

        rows.into_iter().map(PurchaseRecord::try_from).collect()
    }
}
