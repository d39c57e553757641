use {
    super::{BoxFuture, CacheEntry, CacheStore},
    crate::{Error, ErrorKind, Result},
    redis::{AsyncCommands, aio::ConnectionManager},
    std::{collections::HashMap, fmt, time::Duration},
};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Redis backed cache store.
///
/// All entries live as JSON values in a single hash named after the
/// namespace, so clearing the namespace clears the cache.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    namespace: String,
}

impl fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStore")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

impl RedisStore {
    /// Connects to `url` and checks the connection with a `PING`.
    pub async fn connect(url: &str, namespace: impl Into<String>) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let mut conn = tokio::time::timeout(CONNECT_TIMEOUT, ConnectionManager::new(client))
            .await
            .map_err(|_| Error::cache_backend(format!("timed out connecting to {url}")))??;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(Self {
            conn,
            namespace: namespace.into(),
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

fn decode(raw: &str) -> Result<CacheEntry> {
    serde_json::from_str(raw).map_err(|e| Error::new(ErrorKind::CacheBackend, e))
}

impl CacheStore for RedisStore {
    fn backend(&self) -> &'static str {
        "redis"
    }

    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<CacheEntry>>> {
        let mut conn = self.conn.clone();
        Box::pin(async move {
            let raw: Option<String> = conn.hget(&self.namespace, key).await?;
            raw.as_deref().map(decode).transpose()
        })
    }

    fn set<'a>(&'a self, key: &'a str, entry: CacheEntry) -> BoxFuture<'a, Result<()>> {
        let mut conn = self.conn.clone();
        Box::pin(async move {
            let raw = serde_json::to_string(&entry).map_err(|e| Error::new(ErrorKind::CacheBackend, e))?;
            let _: () = conn.hset(&self.namespace, key, raw).await?;
            Ok(())
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<CacheEntry>>> {
        let mut conn = self.conn.clone();
        Box::pin(async move {
            let (raw, _removed): (Option<String>, i64) = redis::pipe()
                .atomic()
                .hget(&self.namespace, key)
                .hdel(&self.namespace, key)
                .query_async(&mut conn)
                .await?;
            raw.as_deref().map(decode).transpose()
        })
    }

    fn entries(&self) -> BoxFuture<'_, Result<Vec<(String, CacheEntry)>>> {
        let mut conn = self.conn.clone();
        Box::pin(async move {
            let raw: HashMap<String, String> = conn.hgetall(&self.namespace).await?;
            Ok(raw
                .into_iter()
                .filter_map(|(key, value)| match decode(&value) {
                    Ok(entry) => Some((key, entry)),
                    Err(error) => {
                        tracing::warn!(%error, key, "Skipping undecodable cache entry");
                        None
                    }
                })
                .collect())
        })
    }
}
