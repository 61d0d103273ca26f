use std::future::Future;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use moka::future::Cache;
use moka::Expiry;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use tradeintel_models::Origin;

use crate::error::CacheError;

/// What a fetch function hands back to the cache.
#[derive(Debug, Clone)]
pub struct CachedPayload {
    pub value: Value,
    pub origin: Origin,
    pub error: Option<String>,
}

/// A stored value with its fetch time and freshness window.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: String,
    pub value: Value,
    pub origin: Origin,
    pub error: Option<String>,
    pub fetched_at: DateTime<Utc>,
    pub ttl: Duration,
}

impl CacheEntry {
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, CacheError> {
        serde_json::from_value(self.value.clone()).map_err(|source| CacheError::Json {
            key: self.key.clone(),
            source,
        })
    }
}

/// Expires each entry after its own TTL, restarting the window on overwrite.
struct EntryExpiry;

impl Expiry<String, CacheEntry> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Cache-aside store shared by every tool call.
///
/// Backed by moka, so lookups for different keys never contend on a common
/// lock, and concurrent `get_or_fetch` calls for the same missing key wait
/// on a single fetch instead of each hitting the upstream.
pub struct TtlCache {
    inner: Cache<String, CacheEntry>,
}

impl TtlCache {
    pub fn new(max_entries: u64) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_entries)
                .expire_after(EntryExpiry)
                .build(),
        }
    }

    /// Return the fresh entry for `key`, or run `fetch` and store its result for `ttl`.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, ttl: Duration, fetch: F) -> CacheEntry
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = CachedPayload>,
    {
        let owned_key = key.to_string();
        self.inner
            .get_with(owned_key.clone(), async move {
                debug!(key = %owned_key, ttl_secs = ttl.as_secs(), "Cache miss, fetching");
                let payload = fetch().await;
                CacheEntry {
                    key: owned_key,
                    value: payload.value,
                    origin: payload.origin,
                    error: payload.error,
                    fetched_at: Utc::now(),
                    ttl,
                }
            })
            .await
    }

    pub async fn get(&self, key: &str) -> Option<CacheEntry> {
        self.inner.get(key).await
    }

    /// Force the next `get_or_fetch` for `key` to fetch again.
    pub async fn invalidate(&self, key: &str) {
        self.inner.invalidate(key).await;
    }

    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}
