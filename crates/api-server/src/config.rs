use marketwatch_scraper::MarketWatchConfig;
use polygon_client::PolygonConfig;
use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Server settings, read from the environment (a `.env` file is loaded first).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub cache_ttl: Duration,
    pub polygon: PolygonConfig,
    pub marketwatch: MarketWatchConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source. Unset or blank variables take their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let timeout = Duration::from_secs(parse_var(&get, "UPSTREAM_TIMEOUT_SECS", 10u64)?);

        let polygon_defaults = PolygonConfig::default();
        let polygon = PolygonConfig {
            base_url: get("POLYGON_BASE_URL").unwrap_or(polygon_defaults.base_url),
            api_key: get("POLYGON_API_KEY").unwrap_or_default(),
            timeout,
            rate_limit: parse_var(&get, "POLYGON_RATE_LIMIT", polygon_defaults.rate_limit)?,
        };

        let marketwatch = MarketWatchConfig {
            base_url: get("MARKETWATCH_BASE_URL").unwrap_or(MarketWatchConfig::default().base_url),
            cookie: get("MARKETWATCH_COOKIE").unwrap_or_default(),
            timeout,
        };

        Ok(Self {
            bind_addr: parse_var(&get, "BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 3000)))?,
            database_url: get("DATABASE_URL").unwrap_or_else(|| "sqlite:stocks.db".to_string()),
            cache_ttl: Duration::from_secs(parse_var(&get, "STOCK_CACHE_SECONDS", 300u64)?),
            polygon,
            marketwatch,
        })
    }
}

fn parse_var<T>(get: &impl Fn(&str) -> Option<String>, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match get(var) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}
