use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use stock_core::{CompanyLookup, MarketDataSource, OhlcRecord, OhlcStatus};
use tokio::sync::Mutex;
use tokio::time::Instant;

pub mod error;

pub use error::{PolygonError, PolygonResult};

pub const DEFAULT_BASE_URL: &str = "https://api.polygon.io";

/// Sliding-window rate limiter: at most `max_requests` per `window` duration.
#[derive(Clone)]
struct RateLimiter {
    timestamps: Arc<Mutex<VecDeque<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: Arc::new(Mutex::new(VecDeque::new())),
            max_requests: max_requests.max(1),
            window,
        }
    }

    async fn acquire(&self) {
        loop {
            let mut ts = self.timestamps.lock().await;
            let now = Instant::now();

            // Remove timestamps outside the window
            while let Some(&front) = ts.front() {
                if now.duration_since(front) >= self.window {
                    ts.pop_front();
                } else {
                    break;
                }
            }

            if ts.len() < self.max_requests {
                ts.push_back(now);
                return;
            }

            // Wait until the oldest request falls out of the window
            let oldest = match ts.front() {
                Some(&t) => t,
                None => continue,
            };
            let sleep_dur = (oldest + self.window).saturating_duration_since(now) + Duration::from_millis(50);
            drop(ts);
            tracing::debug!("Rate limiter: waiting {:.1}s for Polygon API slot", sleep_dur.as_secs_f64());
            tokio::time::sleep(sleep_dur).await;
        }
    }
}

#[derive(Debug, Clone)]
pub struct PolygonConfig {
    pub base_url: String,
    pub api_key: String,
    /// Per-request timeout; a timeout is reported like any transport failure.
    pub timeout: Duration,
    /// Requests per minute.
    pub rate_limit: usize,
}

impl Default for PolygonConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            timeout: Duration::from_secs(10),
            // Default 500 req/min for Starter plan. Free tier users should use 5.
            rate_limit: 500,
        }
    }
}

#[derive(Clone)]
pub struct PolygonClient {
    base_url: String,
    api_key: String,
    client: Client,
    rate_limiter: RateLimiter,
}

impl PolygonClient {
    pub fn new(config: PolygonConfig) -> PolygonResult<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            client,
            rate_limiter: RateLimiter::new(config.rate_limit, Duration::from_secs(60)),
        })
    }

    /// Send a request through the rate limiter. Each call is a single attempt.
    async fn send_request(&self, builder: reqwest::RequestBuilder) -> PolygonResult<reqwest::Response> {
        let request = builder.build()?;
        self.rate_limiter.acquire().await;
        Ok(self.client.execute(request).await?)
    }

    /// Look up the company name for a ticker via `/v3/reference/tickers`.
    ///
    /// `Ok(None)` means the provider answered but knows no such ticker (or no name for it).
    pub async fn get_company_name(&self, symbol: &str) -> PolygonResult<Option<String>> {
        let url = format!("{}/v3/reference/tickers", self.base_url);

        let response = self.send_request(
            self.client.get(&url).query(&[("ticker", symbol), ("apiKey", self.api_key.as_str())])
        ).await?;

        if !response.status().is_success() {
            return Err(PolygonError::Status {
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let body: TickerSearchResponse = response
            .json()
            .await
            .map_err(|e| PolygonError::InvalidResponse(e.to_string()))?;

        Ok(body
            .results
            .into_iter()
            .next()
            .and_then(|t| t.name)
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty()))
    }

    /// Fetch one session's open/close via `/v1/open-close/{symbol}/{date}`.
    ///
    /// A 404 whose body carries a provider status (e.g. `NOT_FOUND` on a holiday)
    /// is returned as a decoded response rather than an error.
    pub async fn get_open_close(&self, symbol: &str, date: NaiveDate) -> PolygonResult<OpenCloseResponse> {
        let url = format!(
            "{}/v1/open-close/{}/{}",
            self.base_url,
            symbol,
            date.format("%Y-%m-%d")
        );

        let response = self.send_request(
            self.client
                .get(&url)
                .bearer_auth(&self.api_key)
                .header("Accept", "application/json")
        ).await?;

        let status = response.status();
        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| PolygonError::InvalidResponse(e.to_string()));
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::NOT_FOUND {
            if let Ok(parsed) = serde_json::from_str::<OpenCloseResponse>(&body) {
                if parsed.status.is_some() {
                    return Ok(parsed);
                }
            }
        }

        Err(PolygonError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl MarketDataSource for PolygonClient {
    async fn resolve_company_name(&self, ticker: &str) -> CompanyLookup {
        match self.get_company_name(ticker).await {
            Ok(Some(name)) => CompanyLookup::Found { name },
            Ok(None) => {
                tracing::info!("Ticker {} not found on Polygon", ticker);
                CompanyLookup::NotFound
            }
            Err(e) => {
                tracing::error!("Polygon company info failed for {}: {}", ticker, e);
                CompanyLookup::Unavailable { reason: e.to_string() }
            }
        }
    }

    async fn daily_ohlc(&self, ticker: &str, date: NaiveDate) -> OhlcRecord {
        let day = date.format("%Y-%m-%d").to_string();
        match self.get_open_close(ticker, date).await {
            Ok(response) => response.into_record(ticker, &day),
            Err(e) => {
                tracing::warn!("Polygon failed for {} on {}: {}", ticker, day, e);
                OhlcRecord::error(ticker, &day, e.to_string())
            }
        }
    }
}

// Response structures
#[derive(Debug, Deserialize)]
struct TickerSearchResponse {
    #[serde(default)]
    results: Vec<TickerSearchEntry>,
}

#[derive(Debug, Deserialize)]
struct TickerSearchEntry {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenCloseResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub open: Option<f64>,
    #[serde(default)]
    pub high: Option<f64>,
    #[serde(default)]
    pub low: Option<f64>,
    #[serde(default)]
    pub close: Option<f64>,
}

impl OpenCloseResponse {
    /// A payload without a status field counts as OK. `date` is the session
    /// date the provider reported, empty when it sent none.
    pub fn into_record(self, ticker: &str, day: &str) -> OhlcRecord {
        if let Some(status) = self.status.as_deref() {
            if status != "OK" {
                return OhlcRecord::invalid_date(ticker, day);
            }
        }

        OhlcRecord {
            status: OhlcStatus::Ok,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            date: self.from.unwrap_or_default(),
            symbol: self.symbol.unwrap_or_else(|| ticker.to_string()),
            error_message: None,
        }
    }
}
