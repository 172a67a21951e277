//! FxCache - Fetches and caches ruble exchange rates
//!
//! The cache is an explicit injected object holding `(rate, expiry)` pairs;
//! callers pass the current instant, so tests control time directly and no
//! process-wide mutable state exists.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

pub type RateResult<T> = Result<T, RateError>;

#[derive(Debug, Clone, thiserror::Error)]
pub enum RateError {
    #[error("rate source unavailable: {0}")]
    Unavailable(String),

    #[error("no ruble rate published for {0}")]
    UnknownCurrency(String),
}

/// External source of rubles-per-unit rates for foreign currencies.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Rubles per one unit of `currency` (e.g. "USD" -> 92.5).
    async fn rub_rate(&self, currency: &str) -> RateResult<f64>;
}

#[derive(Debug, Clone, Copy)]
struct CachedRate {
    rate: f64,
    expires_at: DateTime<Utc>,
}

/// TTL cache over a [`RateSource`].
pub struct FxCache {
    source: Arc<dyn RateSource>,
    ttl: Duration,
    entries: Mutex<HashMap<String, CachedRate>>,
}

impl FxCache {
    pub fn new(source: Arc<dyn RateSource>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Rubles per unit of `currency` as of `now`, served from cache while
    /// the entry is fresh.
    pub async fn rub_rate(&self, currency: &str, now: DateTime<Utc>) -> RateResult<f64> {
        let key = currency.to_ascii_uppercase();

        if let Some(cached) = self.entries.lock().await.get(&key) {
            if cached.expires_at > now {
                tracing::debug!("Serving cached rate for {}", key);
                return Ok(cached.rate);
            }
        }

        let rate = self.source.rub_rate(&key).await?;

        let mut entries = self.entries.lock().await;
        entries.insert(
            key.clone(),
            CachedRate {
                rate,
                expires_at: now + self.ttl,
            },
        );
        tracing::debug!("Cached rate for {}: {}", key, rate);

        Ok(rate)
    }

    /// Drop every cached entry.
    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }
}
