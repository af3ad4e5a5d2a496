use thiserror::Error;

#[derive(Error, Debug)]
pub enum StockError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

pub type StockResult<T> = Result<T, StockError>;
