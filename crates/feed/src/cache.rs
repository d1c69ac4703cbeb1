// ABOUTME: Key-value cache contract consumed by the pipeline, plus an in-memory TTL implementation.
// ABOUTME: try_get implements get-or-produce-and-store over any Cache with JSON-encoded values.

use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::error::FeedError;

/// String-keyed cache with per-entry TTL.
#[async_trait]
pub trait Cache: Send + Sync {
    /// The stored value, or None on miss or expiry.
    async fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key` for `ttl`.
    async fn set(&self, key: &str, value: String, ttl: Duration);
}

/// Whether a [`try_get`] call was served from the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Hit,
    Miss,
}

/// Returns the cached value for `key`, or runs `produce`, stores its result for
/// `ttl`, and returns it. `force_refresh` skips the read.
///
/// A cached value that no longer decodes is treated as a miss. Producer errors are
/// returned as-is and nothing is stored.
pub async fn try_get<C, T, E, F, Fut>(
    cache: &C,
    key: &str,
    ttl: Duration,
    force_refresh: bool,
    produce: F,
) -> Result<(T, Lookup), E>
where
    C: Cache + ?Sized,
    T: Serialize + DeserializeOwned,
    E: From<FeedError>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    if !force_refresh {
        if let Some(raw) = cache.get(key).await {
            match serde_json::from_str(&raw) {
                Ok(value) => return Ok((value, Lookup::Hit)),
                Err(e) => warn!(key, error = %e, "discarding undecodable cache entry"),
            }
        }
    }

    let value = produce().await?;
    let raw = serde_json::to_string(&value).map_err(|e| E::from(FeedError::cache(e)))?;
    cache.set(key, raw, ttl).await;
    Ok((value, Lookup::Miss))
}

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

/// Process-local cache backed by a concurrent map. Expired entries are dropped on read.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<String, Entry>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        let hit = self
            .entries
            .get(key)
            .map(|entry| (entry.expires_at > now).then(|| entry.value.clone()));
        match hit {
            Some(Some(value)) => Some(value),
            Some(None) => {
                self.entries.remove(key);
                None
            }
            None => None,
        }
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) {
        self.entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }
}

/// Cache that never stores anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCache;

#[async_trait]
impl Cache for NoopCache {
    async fn get(&self, _key: &str) -> Option<String> {
        None
    }

    async fn set(&self, _key: &str, _value: String, _ttl: Duration) {}
}
