//!
//! Response optimization: HTML minification, gzip compression and caching.
//!
//! Every response handled by [`ResponseOptimizerLayer`] goes through
//!
//! ```text
//! cache check ──hit──▶ cached response
//!      │ miss
//!      ▼
//!   minify? ──▶ compress? ──▶ cache store? ──▶ response
//! ```
//!
//! * The cache is only consulted and written when the request has a cache
//!   timeout, set per route with [`Optimize`] or inline through
//!   [`OptimizeContext`].
//! * Minification applies to HTML responses when enabled in the
//!   configuration and not skipped by the route.
//! * Compression applies when enabled, not skipped, and the client accepts
//!   gzip.
//! * Only successful responses are cached, after minification and
//!   compression.
//!
//! Failures of a single stage are logged and the stage is skipped; cache
//! backend failures count as misses.
//!
mod compress;
mod content;
mod directives;
mod middleware;
mod minify;

pub use compress::{accepts_gzip, accepts_gzip_header, compress, compress_response, gzip};
pub use content::*;
pub use directives::*;
pub use middleware::*;
pub use minify::{minify, minify_html, minify_response};

use {
    crate::{
        cache::{CachedResponse, ResponseCache, store_from_config},
        config::HttpOptimizerConfig,
    },
    http::header,
    std::{sync::Arc, time::Duration},
};

/// The optimizer stages bound to a configuration and a cache.
#[derive(Clone, Debug)]
pub struct ResponseOptimizer {
    config: Arc<HttpOptimizerConfig>,
    cache: ResponseCache,
}

impl ResponseOptimizer {
    pub fn new(config: HttpOptimizerConfig, cache: ResponseCache) -> Self {
        Self {
            config: Arc::new(config),
            cache,
        }
    }

    /// Builds the optimizer and its cache store from configuration.
    pub async fn from_config(config: &HttpOptimizerConfig) -> Self {
        let store = store_from_config(&config.cache).await;
        Self::new(config.clone(), ResponseCache::new(store))
    }

    pub fn config(&self) -> &HttpOptimizerConfig {
        &self.config
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn layer(&self) -> ResponseOptimizerLayer {
        ResponseOptimizerLayer::new(self.clone())
    }

    /// A fresh cached response for `key`.
    ///
    /// A gzip encoded entry counts as a miss for a client that does not
    /// accept gzip.
    pub async fn check_cache(&self, key: &str, accepts_gzip: bool) -> Option<CachedResponse> {
        let entry = self.cache.lookup(key).await?;
        let gzipped = entry
            .value
            .header(header::CONTENT_ENCODING.as_str())
            .is_some_and(|encoding| encoding.eq_ignore_ascii_case("gzip"));
        if gzipped && !accepts_gzip {
            tracing::debug!(key, "Cached response is gzipped but the client does not accept gzip");
            return None;
        }
        Some(entry.value)
    }

    pub fn should_minify(&self, directives: &OptimizeDirectives) -> bool {
        self.config.minify && !directives.skip_minify
    }

    pub fn should_compress(&self, directives: &OptimizeDirectives, accepts_gzip: bool) -> bool {
        self.config.compress && !directives.skip_compress && accepts_gzip
    }

    /// Runs the minify and compress stages on `response`.
    pub fn optimize(
        &self,
        mut response: CachedResponse,
        directives: &OptimizeDirectives,
        accepts_gzip: bool,
    ) -> CachedResponse {
        if self.should_minify(directives)
            && let Err(error) = minify_response(&mut response)
        {
            tracing::warn!(%error, "Skipping minification");
        }
        if self.should_compress(directives, accepts_gzip)
            && let Err(error) = compress_response(&mut response)
        {
            tracing::warn!(%error, "Skipping compression");
        }
        response
    }

    /// Caches `response` under `key` for `ttl`. Zero durations and
    /// unsuccessful responses are not stored.
    pub async fn store_cache(&self, key: &str, response: CachedResponse, ttl: Duration) {
        if ttl.is_zero() || !response.status().is_success() {
            return;
        }
        tracing::debug!(key, ttl = %humantime::format_duration(ttl), "Caching response");
        self.cache.store(key, response, ttl).await;
    }

    /// Removes the cached response under `key`.
    pub async fn clear_key(&self, key: &str) -> crate::Result<Option<CachedResponse>> {
        self.cache.clear_key(key).await
    }

    /// Caches `content` under `key` without serving it, keeping the expiry
    /// of an existing entry.
    pub async fn seed(&self, key: &str, content: impl Into<Content>) -> crate::Result<()> {
        let value = content.into().into_cached()?;
        self.cache
            .seed(key, value, self.config.default_cache_timeout)
            .await
    }
}
