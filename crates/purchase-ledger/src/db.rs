use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use stock_core::{StockError, StockResult};

pub(crate) fn db_err(e: sqlx::Error) -> StockError {
    StockError::Database(e.to_string())
}

#[derive(Clone)]
pub struct LedgerDb {
    pool: SqlitePool,
}

impl LedgerDb {
    /// Open (creating if missing) the database and apply the schema.
    pub async fn new(database_url: &str) -> StockResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(db_err)?
            .create_if_missing(true);

        // Every connection to `sqlite::memory:` is its own database, so keep
        // exactly one and never let it expire.
        let pool_options = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options.connect_with(options).await.map_err(db_err)?;

        let db = Self { pool };
        db.init_schema().await?;

        tracing::info!("Purchase ledger ready at {}", database_url);
        Ok(db)
    }

    async fn init_schema(&self) -> StockResult<()> {
        let schema = include_str!("../schema.sql");

        // sqlx executes one statement per query
        for statement in schema.split(';') {
            let stmt = statement.trim();
            if !stmt.is_empty() {
                sqlx::query(stmt).execute(&self.pool).await.map_err(db_err)?;
            }
        }

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
