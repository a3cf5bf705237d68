use parking_lot::RwLock;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Cached value with the moment it was stored and how long it stays fresh.
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    value: T,
    stored_at: Instant,
    ttl: Duration,
}

impl<T> CacheEntry<T> {
    fn is_fresh(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) < self.ttl
    }
}

/// In-memory key/value cache with per-entry TTL.
#[derive(Debug, Clone)]
pub struct Cache<T: Clone + Send + Sync> {
    entries: Arc<RwLock<HashMap<String, CacheEntry<T>>>>,
    default_ttl: Duration,
}

impl<T: Clone + Send + Sync + 'static> Cache<T> {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            default_ttl,
        }
    }

    pub fn set(&self, key: impl Into<String>, value: T) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    pub fn set_with_ttl(&self, key: impl Into<String>, value: T, ttl: Duration) {
        let entry = CacheEntry {
            value,
            stored_at: Instant::now(),
            ttl,
        };
        self.entries.write().insert(key.into(), entry);
    }

    /// Fresh value for `key`; expired entries read as absent.
    pub fn get(&self, key: &str) -> Option<T> {
        let now = Instant::now();
        self.entries
            .read()
            .get(key)
            .filter(|entry| entry.is_fresh(now))
            .map(|entry| entry.value.clone())
    }

    pub fn invalidate(&self, key: &str) -> bool {
        self.entries.write().remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drops expired entries, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_fresh(now));
        before - entries.len()
    }

    /// Cache-aside read: return the fresh value or run `fetch`, storing its
    /// result. Failed fetches are not cached.
    pub async fn get_or_fetch<E, F, Fut>(&self, key: &str, fetch: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(hit) = self.get(key) {
            debug!("Cache hit: {}", key);
            return Ok(hit);
        }

        debug!("Cache miss: {}", key);
        let value = fetch().await?;
        self.set(key, value.clone());
        Ok(value)
    }
}

/// Builds a cache key like `projects:page=1:limit=20`.
pub fn cache_key(prefix: &str, parts: &[(&str, Option<&str>)]) -> String {
    let mut key = prefix.to_string();
    for (name, value) in parts {
        if let Some(value) = value {
            key.push(':');
            key.push_str(name);
            key.push('=');
            key.push_str(value);
        }
    }
    key
}
