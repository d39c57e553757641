use {
    super::{BoxFuture, CacheEntry, CacheStore, MemoryStore, SharedCacheStore},
    crate::Result,
};

/// Wraps a remote store and keeps serving from memory while it fails.
///
/// Every operation goes to the primary first. On error the operation is
/// logged and replayed against a local [`MemoryStore`], so a Redis outage
/// degrades caching to per-process instead of turning into misses.
#[derive(Debug)]
pub struct FallbackStore {
    primary: SharedCacheStore,
    fallback: MemoryStore,
}

impl FallbackStore {
    pub fn new(primary: SharedCacheStore) -> Self {
        Self {
            primary,
            fallback: MemoryStore::new(),
        }
    }

    pub fn fallback(&self) -> &MemoryStore {
        &self.fallback
    }
}

impl CacheStore for FallbackStore {
    fn backend(&self) -> &'static str {
        self.primary.backend()
    }

    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<CacheEntry>>> {
        Box::pin(async move {
            match self.primary.get(key).await {
                Ok(entry) => Ok(entry),
                Err(error) => {
                    tracing::warn!(%error, backend = self.primary.backend(), "Cache get failed, using memory");
                    self.fallback.get(key).await
                }
            }
        })
    }

    fn set<'a>(&'a self, key: &'a str, entry: CacheEntry) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            match self.primary.set(key, entry.clone()).await {
                Ok(()) => Ok(()),
                Err(error) => {
                    tracing::warn!(%error, backend = self.primary.backend(), "Cache set failed, using memory");
                    self.fallback.set(key, entry).await
                }
            }
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<CacheEntry>>> {
        Box::pin(async move {
            let local = self.fallback.delete(key).await?;
            match self.primary.delete(key).await {
                Ok(remote) => Ok(remote.or(local)),
                Err(error) => {
                    tracing::warn!(%error, backend = self.primary.backend(), "Cache delete failed, using memory");
                    Ok(local)
                }
            }
        })
    }

    fn entries(&self) -> BoxFuture<'_, Result<Vec<(String, CacheEntry)>>> {
        Box::pin(async move {
            let mut entries = self.fallback.entries().await?;
            match self.primary.entries().await {
                Ok(remote) => entries.extend(remote),
                Err(error) => {
                    tracing::warn!(%error, backend = self.primary.backend(), "Cache scan failed, using memory");
                }
            }
            Ok(entries)
        })
    }
}
