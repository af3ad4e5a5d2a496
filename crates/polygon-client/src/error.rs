use thiserror::Error;

#[derive(Error, Debug)]
pub enum PolygonError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

pub type PolygonResult<T> = Result<T, PolygonError>;
