//! Stock payload and purchase endpoints.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use crate::error::{purchase_err, AppError};
use crate::AppState;

pub fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/api/stock/:symbol", get(get_stock).post(add_purchase))
        .route("/api/stock/:symbol/", get(get_stock).post(add_purchase))
        .route("/api/stock/:symbol/purchases", get(list_purchases))
}

async fn get_stock(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let (payload, outcome) = state.service.payload(&symbol).await?;
    let status = StatusCode::from_u16(outcome.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    Ok((status, Json(payload)))
}

async fn add_purchase(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let body: Value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice(&body).map_err(|_| AppError::bad_request("malformed JSON body"))?
    };
    let amount = body.get("amount").unwrap_or(&Value::Null);

    let receipt = state
        .service
        .record_purchase(&symbol, amount)
        .await
        .map_err(purchase_err)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "status": "ok", "message": receipt.message })),
    ))
}

async fn list_purchases(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<Value>, AppError> {
    let purchases = state.service.purchases(&symbol).await?;
    Ok(Json(json!({ "status": "ok", "purchases": purchases })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::NaiveDate;
    use purchase_ledger::{LedgerDb, SqliteLedger};
    use std::sync::Arc;
    use std::time::Duration;
    use stock_core::{
        AnalyticsSnapshot, AnalyticsSource, CompanyLookup, MarketDataSource, OhlcRecord, OhlcStatus,
    };
    use stock_service::StockService;
    use tower::ServiceExt;

    struct StubMarket;

    #[async_trait]
    impl MarketDataSource for StubMarket {
        async fn resolve_company_name(&self, ticker: &str) -> CompanyLookup {
            match ticker {
                "AAPL" => CompanyLookup::Found { name: "Apple Inc.".to_string() },
                "DOWN" => CompanyLookup::Unavailable { reason: "timeout".to_string() },
                _ => CompanyLookup::NotFound,
            }
        }

        async fn daily_ohlc(&self, ticker: &str, date: NaiveDate) -> OhlcRecord {
            OhlcRecord {
                status: OhlcStatus::Ok,
                open: Some(1.0),
                high: Some(2.0),
                low: Some(0.5),
                close: Some(1.5),
                date: date.to_string(),
                symbol: ticker.to_string(),
                error_message: None,
            }
        }
    }

    struct StubAnalytics;

    #[async_trait]
    impl AnalyticsSource for StubAnalytics {
        async fn fetch(&self, _ticker: &str) -> AnalyticsSnapshot {
            AnalyticsSnapshot::default()
        }
    }

    async fn test_app() -> Router {
        let ledger = SqliteLedger::new(LedgerDb::new("sqlite::memory:").await.unwrap());
        let service = StockService::new(
            Arc::new(ledger),
            Arc::new(StubMarket),
            Arc::new(StubAnalytics),
            Duration::from_secs(300),
        );
        crate::app(AppState { service: Arc::new(service) })
    }

    async fn send(app: &Router, method: &str, uri: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_get_new_ticker() {
        let app = test_app().await;
        let (status, body) = send(&app, "GET", "/api/stock/aapl", "").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["company_code"], "AAPL");
        assert_eq!(body["company_name"], "Apple Inc.");
        assert_eq!(body["purchased_status"], "none");
        assert_eq!(body["purchased_amount"], 0.0);
        assert_eq!(body["performance_data"].as_object().unwrap().len(), 5);
        assert_eq!(body["competitors"], json!([]));
    }

    #[tokio::test]
    async fn test_get_error_statuses() {
        let app = test_app().await;

        let (status, body) = send(&app, "GET", "/api/stock/ZZZZ/", "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"status": "error", "error": "invalid or unknown ticker"}));

        let (status, body) = send(&app, "GET", "/api/stock/DOWN", "").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "ticker validation service temporarily unavailable");
    }

    #[tokio::test]
    async fn test_purchase_then_read() {
        let app = test_app().await;

        // Warm the cache so the purchase has something to invalidate.
        send(&app, "GET", "/api/stock/AAPL", "").await;

        let (status, body) = send(&app, "POST", "/api/stock/aapl/", r#"{"amount": "2.5"}"#).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(
            body,
            json!({"status": "ok", "message": "2.5 units of stock AAPL were added to your stock record"})
        );

        let (status, body) = send(&app, "GET", "/api/stock/AAPL", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["purchased_status"], "purchased");
        assert_eq!(body["purchased_amount"], 2.5);

        let (status, body) = send(&app, "GET", "/api/stock/AAPL/purchases", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["purchases"].as_array().unwrap().len(), 1);
        assert_eq!(body["purchases"][0]["ticker"], "AAPL");
    }

    #[tokio::test]
    async fn test_purchase_validation_messages() {
        let app = test_app().await;

        let cases = [
            (r#"{"amount": "abc"}"#, StatusCode::BAD_REQUEST, "amount must be a number"),
            (r#"{"amount": "-1"}"#, StatusCode::BAD_REQUEST, "amount must be > 0"),
            (r#"{"amount": 0}"#, StatusCode::BAD_REQUEST, "amount must be > 0"),
            (r#"{"amount": "-1e30"}"#, StatusCode::BAD_REQUEST, "amount must be > 0"),
            (r#"{"amount": 1e30}"#, StatusCode::BAD_REQUEST, "amount is out of range"),
            (r#"{}"#, StatusCode::BAD_REQUEST, "amount is required"),
            ("", StatusCode::BAD_REQUEST, "amount is required"),
            ("{not json", StatusCode::BAD_REQUEST, "malformed JSON body"),
        ];
        for (body, expected_status, message) in cases {
            let (status, response) = send(&app, "POST", "/api/stock/AAPL", body).await;
            assert_eq!(status, expected_status, "body {:?}", body);
            assert_eq!(response["status"], "error");
            assert_eq!(response["error"], message, "body {:?}", body);
        }

        let (_, body) = send(&app, "GET", "/api/stock/AAPL/purchases", "").await;
        assert_eq!(body["purchases"], json!([]));
    }

    #[tokio::test]
    async fn test_purchase_upstream_failures() {
        let app = test_app().await;

        let (status, body) = send(&app, "POST", "/api/stock/ZZZZ", r#"{"amount": 1}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid or unknown ticker");

        let (status, body) = send(&app, "POST", "/api/stock/DOWN", r#"{"amount": 1}"#).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "upstream provider unavailable");
    }
}
