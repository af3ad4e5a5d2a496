use dashmap::DashMap;
use std::time::{Duration, Instant};
use stock_core::{normalize_ticker, ConsolidatedPayload, Outcome, StockResult};

use crate::builder::PayloadBuilder;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

struct CacheEntry {
    payload: ConsolidatedPayload,
    cached_at: Instant,
}

/// Per-ticker TTL cache in front of [`PayloadBuilder`]. Only successful
/// payloads are stored.
pub struct ResultCache {
    builder: PayloadBuilder,
    ttl: Duration,
    entries: DashMap<String, CacheEntry>,
}

impl ResultCache {
    pub fn new(builder: PayloadBuilder, ttl: Duration) -> Self {
        Self {
            builder,
            ttl,
            entries: DashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn get_or_build(&self, ticker: &str) -> StockResult<(ConsolidatedPayload, Outcome)> {
        let key = normalize_ticker(ticker);

        if let Some(payload) = self.fresh(&key) {
            tracing::debug!("Cache hit for {}", key);
            return Ok((payload, Outcome::Success));
        }

        // Concurrent misses may both build; the last insert wins.
        let (payload, outcome) = self.builder.build(&key).await?;
        if outcome.is_success() {
            self.entries.insert(key, CacheEntry {
                payload: payload.clone(),
                cached_at: Instant::now(),
            });
        }

        Ok((payload, outcome))
    }

    pub fn invalidate(&self, ticker: &str) {
        if self.entries.remove(&normalize_ticker(ticker)).is_some() {
            tracing::debug!("Invalidated cached payload for {}", ticker);
        }
    }

    fn fresh(&self, key: &str) -> Option<ConsolidatedPayload> {
        let expired = match self.entries.get(key) {
            Some(entry) if entry.cached_at.elapsed() < self.ttl => return Some(entry.payload.clone()),
            Some(_) => true,
            None => false,
        };
        // The read guard is released above; removing while holding it would deadlock.
        if expired {
            self.entries.remove(key);
        }
        None
    }
}
