//!
//! Response cache with pluggable TTL stores.
//!
//! A [`CacheStore`] maps keys to [`CacheEntry`] values. Stores are shared
//! across requests and must be safe to use concurrently. The crate ships an
//! in-process [`MemoryStore`], a Redis backed `RedisStore` (behind the `redis`
//! feature) and a [`FallbackStore`] that keeps serving from memory when the
//! primary backend errors.
//!
//! [`ResponseCache`] adds the expiry rules on top of a store: an entry is a
//! hit only while the current time is strictly before its `expires_at`.
//!
mod entry;
mod fallback;
mod memory;
#[cfg(feature = "redis")]
mod redis;

pub use entry::*;
pub use fallback::*;
pub use memory::*;
#[cfg(feature = "redis")]
pub use redis::*;

use {
    crate::{Result, config::OptimizerCacheConfig},
    std::{
        fmt,
        future::Future,
        pin::Pin,
        sync::Arc,
        time::{Duration, SystemTime},
    },
    tokio_util::task::AbortOnDropHandle,
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Storage backend of the response cache.
///
/// Implementations only store and return entries; expiry is decided by
/// [`ResponseCache`].
pub trait CacheStore: Send + Sync + fmt::Debug + 'static {
    /// Short backend name used in logs.
    fn backend(&self) -> &'static str;

    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<CacheEntry>>>;

    /// Inserts or replaces the entry under `key`.
    fn set<'a>(&'a self, key: &'a str, entry: CacheEntry) -> BoxFuture<'a, Result<()>>;

    /// Removes `key`, returning the previous entry.
    fn delete<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<CacheEntry>>>;

    /// Snapshot of every stored entry.
    fn entries(&self) -> BoxFuture<'_, Result<Vec<(String, CacheEntry)>>>;
}

pub type SharedCacheStore = Arc<dyn CacheStore>;

/// Awaits the construction of a primary store, falling back to a
/// [`MemoryStore`] when it fails.
pub async fn select_store<F>(primary: F) -> SharedCacheStore
where
    F: Future<Output = Result<SharedCacheStore>>,
{
    match primary.await {
        Ok(store) => {
            tracing::info!(backend = store.backend(), "Response cache store ready");
            store
        }
        Err(error) => {
            tracing::warn!(%error, "Cache backend unavailable, using in-memory store");
            Arc::new(MemoryStore::new())
        }
    }
}

/// Builds the store described by `[http.optimizer.cache]`.
///
/// Redis is used when a `redis_url` is configured and the `redis` feature is
/// enabled; any connection failure degrades to the in-memory store.
pub async fn store_from_config(config: &OptimizerCacheConfig) -> SharedCacheStore {
    match config.redis_url() {
        #[cfg(feature = "redis")]
        Some(url) => {
            let namespace = config.namespace.clone();
            select_store(async move {
                let store = RedisStore::connect(url, namespace).await?;
                Ok(Arc::new(FallbackStore::new(Arc::new(store))) as SharedCacheStore)
            })
            .await
        }
        #[cfg(not(feature = "redis"))]
        Some(_) => {
            tracing::warn!(
                "[http.optimizer.cache] redis_url is set but the `redis` feature is disabled, using in-memory store"
            );
            Arc::new(MemoryStore::new())
        }
        None => Arc::new(MemoryStore::new()),
    }
}

/// TTL semantics over a [`CacheStore`].
///
/// Backend errors are logged and treated as misses on the request path so a
/// broken cache never fails a request.
#[derive(Clone, Debug)]
pub struct ResponseCache {
    store: SharedCacheStore,
}

impl ResponseCache {
    pub fn new(store: SharedCacheStore) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    /// Returns the entry under `key` if it has not expired.
    ///
    /// An expired entry is removed from the store.
    pub async fn lookup(&self, key: &str) -> Option<CacheEntry> {
        let entry = match self.store.get(key).await {
            Ok(entry) => entry?,
            Err(error) => {
                tracing::warn!(%error, key, "Cache lookup failed");
                return None;
            }
        };
        if entry.is_fresh(SystemTime::now()) {
            return Some(entry);
        }
        if let Err(error) = self.store.delete(key).await {
            tracing::debug!(%error, key, "Failed to drop expired cache entry");
        }
        None
    }

    /// Stores `value` under `key` for `ttl`.
    pub async fn store(&self, key: &str, value: CachedResponse, ttl: Duration) {
        if let Err(error) = self.store.set(key, CacheEntry::new(value, ttl)).await {
            tracing::warn!(%error, key, "Cache store failed");
        }
    }

    /// Stores `value` under `key`, keeping the expiry of an existing entry.
    ///
    /// When nothing is cached under `key` yet the entry expires after
    /// `fallback_ttl`.
    pub async fn seed(&self, key: &str, value: CachedResponse, fallback_ttl: Duration) -> Result<()> {
        let expires_at = match self.store.get(key).await? {
            Some(existing) => existing.expires_at,
            None => SystemTime::now() + fallback_ttl,
        };
        self.store.set(key, CacheEntry { value, expires_at }).await
    }

    /// Removes the entry under `key`, returning its value.
    pub async fn clear_key(&self, key: &str) -> Result<Option<CachedResponse>> {
        Ok(self.store.delete(key).await?.map(|entry| entry.value))
    }

    /// Deletes every expired entry and returns how many were removed.
    pub async fn sweep_expired(&self) -> Result<usize> {
        let now = SystemTime::now();
        let mut removed = 0;
        for (key, entry) in self.store.entries().await? {
            if !entry.is_fresh(now) && self.store.delete(&key).await?.is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Spawns a background task sweeping expired entries every `interval`.
    ///
    /// The task stops when the returned handle is dropped.
    pub fn spawn_sweeper(&self, interval: Duration) -> AbortOnDropHandle<()> {
        let cache = self.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match cache.sweep_expired().await {
                    Ok(0) => {}
                    Ok(removed) => tracing::debug!(removed, "Swept expired cache entries"),
                    Err(error) => tracing::warn!(%error, "Cache sweep failed"),
                }
            }
        });
        AbortOnDropHandle::new(handle)
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::in_memory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use http::StatusCode;

    fn response(body: &'static str) -> CachedResponse {
        CachedResponse::new(StatusCode::OK, body)
    }

    #[tokio::test]
    async fn test_lookup_respects_expiry() {
        let store = Arc::new(MemoryStore::new());
        let cache = ResponseCache::new(store.clone());

        cache.store("fresh", response("a"), Duration::from_secs(60)).await;
        assert!(cache.lookup("fresh").await.is_some());

        cache.store("zero", response("b"), Duration::ZERO).await;
        assert!(cache.lookup("zero").await.is_none());
        assert!(store.get("zero").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_entry_expires_after_ttl() {
        let cache = ResponseCache::in_memory();
        cache.store("k", response("a"), Duration::from_millis(30)).await;
        assert!(cache.lookup("k").await.is_some());
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(cache.lookup("k").await.is_none());
    }

    #[tokio::test]
    async fn test_seed_keeps_existing_expiry() {
        let store = Arc::new(MemoryStore::new());
        let cache = ResponseCache::new(store.clone());

        cache.store("k", response("old"), Duration::from_secs(60)).await;
        let before = store.get("k").await.unwrap().unwrap().expires_at;

        cache
            .seed("k", response("new"), Duration::from_secs(3600))
            .await
            .unwrap();
        let after = store.get("k").await.unwrap().unwrap();
        assert_eq!(after.expires_at, before);
        assert_eq!(after.value.body().as_ref(), b"new");
    }

    #[tokio::test]
    async fn test_seed_without_entry_uses_fallback_ttl() {
        let cache = ResponseCache::in_memory();
        cache
            .seed("k", response("seeded"), Duration::from_secs(60))
            .await
            .unwrap();
        let hit = cache.lookup("k").await.unwrap();
        assert_eq!(hit.value.body().as_ref(), b"seeded");
    }

    #[tokio::test]
    async fn test_clear_key_returns_previous_value() {
        let cache = ResponseCache::in_memory();
        cache.store("k", response("gone"), Duration::from_secs(60)).await;
        let removed = cache.clear_key("k").await.unwrap().unwrap();
        assert_eq!(removed.body().as_ref(), b"gone");
        assert!(cache.clear_key("k").await.unwrap().is_none());
        assert!(cache.lookup("k").await.is_none());
    }

    #[tokio::test]
    async fn test_sweep_expired() {
        let store = Arc::new(MemoryStore::new());
        let cache = ResponseCache::new(store.clone());
        cache.store("live", response("a"), Duration::from_secs(60)).await;
        cache.store("dead-1", response("b"), Duration::ZERO).await;
        cache.store("dead-2", response("c"), Duration::ZERO).await;

        assert_eq!(cache.sweep_expired().await.unwrap(), 2);
        assert_eq!(store.len(), 1);
        assert_eq!(cache.sweep_expired().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sweeper_task_removes_entries() {
        let store = Arc::new(MemoryStore::new());
        let cache = ResponseCache::new(store.clone());
        cache.store("dead", response("x"), Duration::ZERO).await;

        let handle = cache.spawn_sweeper(Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(store.is_empty());
        drop(handle);
    }

    #[tokio::test]
    async fn test_select_store_falls_back_to_memory() {
        let store = select_store(async { Err(Error::cache_backend("connection refused")) }).await;
        assert_eq!(store.backend(), "memory");

        let store = select_store(async { Ok(Arc::new(MemoryStore::new()) as SharedCacheStore) }).await;
        assert_eq!(store.backend(), "memory");
    }

    #[tokio::test]
    async fn test_store_from_config_without_redis() {
        let store = store_from_config(&OptimizerCacheConfig::default()).await;
        assert_eq!(store.backend(), "memory");

        let blank = OptimizerCacheConfig::default().with_redis_url("  ");
        assert_eq!(store_from_config(&blank).await.backend(), "memory");
    }
}
