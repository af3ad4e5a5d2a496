use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::Client;
use std::time::Duration;
use stock_core::{AnalyticsSnapshot, AnalyticsSource};

pub mod html;
pub mod parse;

pub use html::{extract_analytics, is_bot_challenge};
pub use parse::{parse_market_cap, parse_percent};

pub const DEFAULT_BASE_URL: &str = "https://www.marketwatch.com";

const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:141.0) Gecko/20100101 Firefox/141.0";

#[derive(Debug, Clone)]
pub struct MarketWatchConfig {
    pub base_url: String,
    /// Session cookie copied from a browser; without it the site usually
    /// answers with a bot challenge.
    pub cookie: String,
    pub timeout: Duration,
}

impl Default for MarketWatchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            cookie: String::new(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Scrapes performance figures and competitors from the MarketWatch quote page.
#[derive(Clone)]
pub struct MarketWatchScraper {
    base_url: String,
    client: Client,
}

impl MarketWatchScraper {
    pub fn new(config: MarketWatchConfig) -> reqwest::Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(browser_headers(&config.cookie))
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Raw page body. The status code is not checked: block pages are
    /// recognised by their content.
    pub async fn fetch_page(&self, symbol: &str) -> reqwest::Result<String> {
        let url = format!("{}/investing/stock/{}", self.base_url, symbol.to_lowercase());
        self.client.get(&url).send().await?.text().await
    }
}

fn browser_headers(cookie: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::USER_AGENT, HeaderValue::from_static(USER_AGENT));
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.5"),
    );
    headers.insert(header::UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));

    if !cookie.is_empty() {
        match HeaderValue::from_str(cookie) {
            Ok(value) => {
                headers.insert(header::COOKIE, value);
            }
            Err(_) => tracing::warn!("MARKETWATCH_COOKIE is not a valid header value; ignoring it"),
        }
    }

    headers
}

#[async_trait]
impl AnalyticsSource for MarketWatchScraper {
    async fn fetch(&self, ticker: &str) -> AnalyticsSnapshot {
        let page = match self.fetch_page(ticker).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("MarketWatch fetch failed for {}: {}", ticker, e);
                return AnalyticsSnapshot::default();
            }
        };

        if is_bot_challenge(&page) {
            tracing::error!("MarketWatch anti-bot page detected for {}; refresh MARKETWATCH_COOKIE", ticker);
            return AnalyticsSnapshot::default();
        }

        let snapshot = extract_analytics(&page);
        if snapshot.performance.is_empty() && snapshot.competitors.is_empty() {
            tracing::info!("MarketWatch page for {} had no performance or competitor data", ticker);
        }
        snapshot
    }
}
