use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use stock_service::PurchaseError;

/// Handler error rendered as `{"status":"error","error":"..."}`.
pub struct AppError {
    status: StatusCode,
    error: anyhow::Error,
}

impl AppError {
    pub fn with_status(status: StatusCode, error: impl Into<anyhow::Error>) -> Self {
        Self {
            status,
            error: error.into(),
        }
    }

    pub fn bad_request(message: &str) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, anyhow::anyhow!("{}", message))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("Request failed: {:#}", self.error);
        }
        let body = json!({ "status": "error", "error": self.error.to_string() });
        (self.status, Json(body)).into_response()
    }
}

/// Anything else reaching a handler boundary is an internal fault.
impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::with_status(StatusCode::INTERNAL_SERVER_ERROR, err)
    }
}

pub fn purchase_err(err: PurchaseError) -> AppError {
    let status = match &err {
        PurchaseError::Amount(_) | PurchaseError::InvalidTicker => StatusCode::BAD_REQUEST,
        PurchaseError::UpstreamUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        PurchaseError::Ledger(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    AppError::with_status(status, err)
}
