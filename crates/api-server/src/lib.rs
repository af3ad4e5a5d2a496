use axum::{http::Request, middleware, routing::get, Json, Router};
use marketwatch_scraper::MarketWatchScraper;
use polygon_client::PolygonClient;
use purchase_ledger::{LedgerDb, SqliteLedger};
use serde_json::{json, Value};
use std::sync::Arc;
use stock_service::StockService;
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod request_id;
pub mod stock_routes;

pub use config::{ConfigError, ServerConfig};
pub use error::AppError;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<StockService>,
}

/// Full router with middleware. The trace span is outermost so the request
/// id recorded by the inner middleware lands on it.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(stock_routes::stock_routes())
        .with_state(state)
        .layer(middleware::from_fn(request_id::no_store_middleware))
        .layer(middleware::from_fn(request_id::request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
            )
        }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// `LOG_FORMAT=json` switches to structured output; `RUST_LOG` filters.
pub fn init_tracing() {
    let json_logging = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if json_logging {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env()?;
    if config.polygon.api_key.is_empty() {
        tracing::warn!("POLYGON_API_KEY is not set; ticker validation and OHLC lookups will fail");
    }
    if config.marketwatch.cookie.is_empty() {
        tracing::warn!("MARKETWATCH_COOKIE is not set; analytics will likely be blocked");
    }
    tracing::info!("Cache TTL: {}s", config.cache_ttl.as_secs());
    tracing::info!("Upstream timeout: {}s", config.polygon.timeout.as_secs());

    let ledger = SqliteLedger::new(LedgerDb::new(&config.database_url).await?);
    let market = PolygonClient::new(config.polygon)?;
    let analytics = MarketWatchScraper::new(config.marketwatch)?;

    let service = StockService::new(
        Arc::new(ledger),
        Arc::new(market),
        Arc::new(analytics),
        config.cache_ttl,
    );
    let app = app(AppState {
        service: Arc::new(service),
    });

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::StatusCode;
    use chrono::NaiveDate;
    use std::time::Duration;
    use stock_core::{AnalyticsSnapshot, AnalyticsSource, CompanyLookup, MarketDataSource, OhlcRecord};
    use tower::ServiceExt;

    struct Offline;

    #[async_trait]
    impl MarketDataSource for Offline {
        async fn resolve_company_name(&self, _ticker: &str) -> CompanyLookup {
            CompanyLookup::Unavailable { reason: "offline".to_string() }
        }

        async fn daily_ohlc(&self, ticker: &str, date: NaiveDate) -> OhlcRecord {
            OhlcRecord::error(ticker, &date.to_string(), "offline")
        }
    }

    #[async_trait]
    impl AnalyticsSource for Offline {
        async fn fetch(&self, _ticker: &str) -> AnalyticsSnapshot {
            AnalyticsSnapshot::default()
        }
    }

    async fn offline_app() -> Router {
        let ledger = SqliteLedger::new(LedgerDb::new("sqlite::memory:").await.unwrap());
        let service = StockService::new(Arc::new(ledger), Arc::new(Offline), Arc::new(Offline), Duration::ZERO);
        app(AppState { service: Arc::new(service) })
    }

    #[tokio::test]
    async fn test_health() {
        let response = offline_app()
            .await
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(serde_json::from_slice::<Value>(&bytes).unwrap(), json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_response_headers() {
        let app = offline_app().await;

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/api/stock/AAPL").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers()["cache-control"], "no-store");
        assert!(response.headers().get("x-content-type-options").is_none());
        let generated = response.headers()["x-request-id"].to_str().unwrap();
        assert_eq!(generated.len(), 36);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("x-request-id", "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()["x-request-id"], "abc-123");
    }
}
