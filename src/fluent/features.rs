//! Feature middleware: response optimizer, CORS, request timeout.

use super::router::FluentRouter;
use crate::{HttpMiddleware, optimizer::ResponseOptimizer};

use {http::StatusCode, tower_http::timeout::TimeoutLayer};

#[cfg(feature = "cors")]
use tower_http::cors::CorsLayer;

impl<State> FluentRouter<State>
where
    State: Clone + Send + Sync + 'static,
{
    /// Installs the response optimizer (minify, compress, cache).
    ///
    /// Uses the optimizer injected with `with_response_optimizer()` or builds
    /// one from `[http.optimizer]`, connecting to Redis when `redis_url` is
    /// set and falling back to the in-memory store otherwise. Without either,
    /// nothing is installed. When `sweep_interval` is set a background task
    /// purges expired entries for as long as the router lives.
    ///
    /// ```toml
    /// [http.optimizer]
    /// minify = true
    /// compress = true
    /// default_cache_timeout = "24h"
    ///
    /// [http.optimizer.cache]
    /// redis_url = "{{ REDIS_URL }}"
    /// sweep_interval = "10m"
    /// ```
    ///
    /// Routes opt into caching with the [`Optimize`](crate::Optimize) layer
    /// or from the handler through [`OptimizeContext`](crate::OptimizeContext).
    pub async fn setup_optimizer(mut self) -> Self {
        if !self.is_middleware_enabled(HttpMiddleware::Optimizer) {
            return self;
        }

        let optimizer = match self.optimizer.take() {
            Some(optimizer) => optimizer,
            None => match &self.config.http.optimizer {
                Some(config) => ResponseOptimizer::from_config(config).await,
                None => return self,
            },
        };

        tracing::info!(
            backend = optimizer.cache().backend(),
            minify = optimizer.config().minify,
            compress = optimizer.config().compress,
            "Response optimizer enabled"
        );

        if let Some(interval) = optimizer.config().cache.sweep_interval {
            self.sweeper_handle = Some(optimizer.cache().spawn_sweeper(interval));
        }

        self.inner = self.inner.layer(optimizer.layer());
        self.optimizer = Some(optimizer);
        self
    }

    /// Aborts requests that take longer than the configured duration with a
    /// `408 Request Timeout` response.
    ///
    /// ```toml
    /// [http]
    /// request_timeout = "30s"
    /// ```
    #[must_use]
    pub fn setup_timeout(mut self) -> Self {
        if !self.is_middleware_enabled(HttpMiddleware::Timeout) {
            return self;
        }

        if let Some(timeout) = self.config.http.request_timeout {
            self.inner = self.inner.layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                timeout,
            ));
        }
        self
    }

    /// Sets up Cross-Origin Resource Sharing (CORS) middleware.
    ///
    /// ```toml
    /// [http.cors]
    /// allow_credentials = true
    /// allowed_origins = ["https://app.example.com"]
    /// allowed_methods = ["GET", "POST"]
    /// allowed_headers = ["content-type", "traceparent"]
    /// max_age = "1h"
    /// ```
    ///
    /// When `allow_credentials` is `true` wildcards are never used. Without a
    /// `[http.cors]` section the policy depends on `RUST_ENV`: same-origin
    /// only in production (or when unset), permissive otherwise.
    #[cfg(feature = "cors")]
    #[must_use]
    pub fn setup_cors(mut self) -> Self {
        if !self.is_middleware_enabled(HttpMiddleware::Cors) {
            return self;
        }

        let cors = match &self.config.http.cors {
            Some(cors_config) => cors_config.to_layer(),
            None if is_production_env() => {
                tracing::warn!(
                    "No [http.cors] section in production, cross-origin requests are refused"
                );
                CorsLayer::new()
            }
            None => {
                tracing::warn!("No [http.cors] section, using permissive CORS");
                CorsLayer::very_permissive()
            }
        };
        self.inner = self.inner.layer(cors);
        self
    }

    /// No-op when `cors` feature is disabled.
    #[cfg(not(feature = "cors"))]
    #[must_use]
    pub fn setup_cors(self) -> Self {
        if self.config.http.cors.is_some() {
            tracing::warn!(
                "CORS is configured but the 'cors' feature is not enabled. \
                 Add `cors` to your Cargo.toml features to enable CORS support."
            );
        }
        self
    }
}

/// True when `RUST_ENV` is unset or names a production environment.
#[cfg(feature = "cors")]
fn is_production_env() -> bool {
    let rust_env = std::env::var("RUST_ENV").unwrap_or_default();
    rust_env.is_empty()
        || ["prod", "production", "release"]
            .iter()
            .any(|env| rust_env.eq_ignore_ascii_case(env))
}
