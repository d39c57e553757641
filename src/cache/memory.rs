use {
    super::{BoxFuture, CacheEntry, CacheStore},
    crate::Result,
    dashmap::DashMap,
    std::{future, sync::Arc},
};

/// In-process cache store backed by a `DashMap`.
///
/// Lives as long as the process. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<DashMap<String, CacheEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CacheStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<CacheEntry>>> {
        let entry = self.entries.get(key).map(|entry| entry.value().clone());
        Box::pin(future::ready(Ok(entry)))
    }

    fn set<'a>(&'a self, key: &'a str, entry: CacheEntry) -> BoxFuture<'a, Result<()>> {
        self.entries.insert(key.to_string(), entry);
        Box::pin(future::ready(Ok(())))
    }

    fn delete<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<CacheEntry>>> {
        let removed = self.entries.remove(key).map(|(_, entry)| entry);
        Box::pin(future::ready(Ok(removed)))
    }

    fn entries(&self) -> BoxFuture<'_, Result<Vec<(String, CacheEntry)>>> {
        let entries = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        Box::pin(future::ready(Ok(entries)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CachedResponse;
    use http::StatusCode;
    use std::time::Duration;

    fn entry(body: &'static str) -> CacheEntry {
        CacheEntry::new(
            CachedResponse::new(StatusCode::OK, body),
            Duration::from_secs(60),
        )
    }

    #[tokio::test]
    async fn test_set_get_delete() {
        let store = MemoryStore::new();
        assert!(store.get("k").await.unwrap().is_none());

        store.set("k", entry("one")).await.unwrap();
        assert_eq!(store.get("k").await.unwrap().unwrap().value.body().as_ref(), b"one");

        store.set("k", entry("two")).await.unwrap();
        assert_eq!(store.len(), 1);

        let removed = store.delete("k").await.unwrap().unwrap();
        assert_eq!(removed.value.body().as_ref(), b"two");
        assert!(store.delete("k").await.unwrap().is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let store = MemoryStore::new();
        let clone = store.clone();
        store.set("k", entry("shared")).await.unwrap();
        assert!(clone.get("k").await.unwrap().is_some());
        assert_eq!(clone.entries().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_writes_to_distinct_keys() {
        let store = MemoryStore::new();
        let mut tasks = Vec::new();
        for i in 0..64 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                let key = format!("key-{i}");
                store.set(&key, entry("v")).await.unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }
        assert_eq!(store.len(), 64);
    }
}
