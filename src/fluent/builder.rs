//! Orchestration and router delegation: setup_middleware(), start(), layer(), route(), etc.

use super::router::FluentRouter;
use crate::Result;

use {
    axum::{Router, body::Body, routing::Route},
    http::Request,
    std::{convert::Infallible, net::SocketAddr},
    tokio::signal,
    tower::{Layer, Service},
};

impl<State> FluentRouter<State>
where
    State: Clone + Send + Sync + 'static,
{
    /// Sets up all standard middleware layers in the correct order.
    ///
    /// Call this after routes have been added (`add_api`, `route`, ...): the
    /// layers only wrap routes that already exist.
    ///
    /// # Middleware Order
    ///
    /// The last layer added is the outermost layer and executes first on
    /// incoming requests. From innermost to outermost:
    ///
    /// 1. **Fallback** - JSON 404 for unmatched routes
    /// 2. **Tracing** - one server span per request
    /// 3. **Optimizer** - minify, compress and cache responses
    /// 4. **CORS** - preflight and headers, also on cached responses
    /// 5. **Metrics** - measure all requests
    /// 6. **Timeout** - bound the whole request
    /// 7. **Panic catching** - catch all panics from inner layers
    ///
    /// Individual layers can be left out with `[http] exclude = [...]`.
    ///
    /// Disable Prometheus in tests to avoid global registry conflicts:
    ///
    /// ```rust
    /// # use axum_openapi_plus::Config;
    /// let config = Config::default().with_metrics(false);
    /// ```
    pub async fn setup_middleware(self) -> Result<Self> {
        const PACKAGE_NAME: &str = env!("CARGO_PKG_NAME");
        const VERSION: &str = env!("CARGO_PKG_VERSION");
        tracing::info!("Starting {PACKAGE_NAME} version {VERSION}...");

        let router = self
            .setup_fallback() // 1. JSON 404
            .setup_tracing() // 2. Request spans
            .setup_optimizer() // 3. Response optimizer
            .await
            .setup_cors() // 4. CORS handling
            .setup_metrics() // 5. Metrics collection
            .setup_timeout() // 6. Request timeout (optional)
            .setup_catch_panic(); // 7. Outermost - panic recovery

        Ok(router)
    }

    /// Starts the HTTP server based on the current configuration.
    ///
    /// On SIGTERM or Ctrl+C the server stops accepting connections and waits
    /// up to `http.shutdown_timeout` for in-flight requests to finish.
    pub async fn start(self) -> Result<()> {
        let bind_addr = self.config.http.full_bind_addr();
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

        tracing::info!("Bound to {}", &bind_addr);
        tracing::info!("Waiting for connections");

        let service = self
            .inner
            .with_state(self.state)
            .into_make_service_with_connect_info::<SocketAddr>();

        let shutdown_timeout = self.config.http.shutdown_timeout;
        let (signal_tx, signal_rx) = tokio::sync::oneshot::channel::<()>();

        let serve_future = axum::serve(listener, service).with_graceful_shutdown(async move {
            shutdown_signal().await;
            signal_tx.send(()).ok();
        });

        // The grace period only starts once a signal was received.
        tokio::select! {
            result = serve_future => {
                tracing::info!("Graceful shutdown completed");
                result?;
            }
            _ = async {
                if signal_rx.await.is_err() {
                    std::future::pending::<()>().await;
                }
                tokio::time::sleep(shutdown_timeout).await;
            } => {
                tracing::warn!(
                    timeout = %humantime::format_duration(shutdown_timeout),
                    "Graceful shutdown timeout expired, forcing shutdown"
                );
            }
        }

        // Keep the cache sweeper alive until the server is gone.
        drop(self.sweeper_handle);
        Ok(())
    }

    /// Adds a custom Tower middleware layer to the router.
    ///
    /// ```rust,no_run
    /// use axum::http::StatusCode;
    /// use std::time::Duration;
    /// use tower_http::timeout::TimeoutLayer;
    /// # use axum_openapi_plus::{Config, FluentRouter};
    /// # fn example() -> axum_openapi_plus::Result<()> {
    /// let router = FluentRouter::without_state(Config::default())?
    ///     .layer(TimeoutLayer::with_status_code(
    ///         StatusCode::SERVICE_UNAVAILABLE,
    ///         Duration::from_secs(5),
    ///     ));
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn layer<L>(mut self, layer: L) -> Self
    where
        L: Layer<Route> + Clone + Send + Sync + 'static,
        L::Service: Service<Request<Body>> + Clone + Send + Sync + 'static,
        <L::Service as Service<Request<Body>>>::Response: axum::response::IntoResponse + 'static,
        <L::Service as Service<Request<Body>>>::Error: Into<Infallible> + 'static,
        <L::Service as Service<Request<Body>>>::Future: Send + 'static,
    {
        self.inner = self.inner.layer(layer);
        self
    }

    /// Adds a route outside of any OpenAPI document.
    ///
    /// ```
    /// use axum_openapi_plus::{Config, FluentRouter};
    /// use axum::routing::get;
    ///
    /// async fn handler() -> &'static str {
    ///     "Hello, World!"
    /// }
    ///
    /// let router = FluentRouter::without_state(Config::default())
    ///     .unwrap()
    ///     .route("/hello", get(handler))
    ///     .into_inner();
    /// ```
    #[must_use]
    pub fn route(mut self, path: &str, route: axum::routing::MethodRouter<State>) -> Self {
        self.inner = self.inner.route(path, route);
        self
    }

    /// Adds a middleware layer that only applies to routes already added,
    /// not to the fallback.
    #[must_use]
    pub fn route_layer<L>(mut self, layer: L) -> Self
    where
        L: Layer<Route> + Clone + Send + Sync + 'static,
        L::Service: Service<Request<Body>> + Clone + Send + Sync + 'static,
        <L::Service as Service<Request<Body>>>::Response: axum::response::IntoResponse + 'static,
        <L::Service as Service<Request<Body>>>::Error: Into<Infallible> + 'static,
        <L::Service as Service<Request<Body>>>::Future: Send + 'static,
    {
        self.inner = self.inner.route_layer(layer);
        self
    }

    /// Nests another router at a specific path prefix.
    #[must_use]
    pub fn nest(mut self, path: &str, router: Router<State>) -> Self {
        self.inner = self.inner.nest(path, router);
        self
    }

    /// Merges another router into this one.
    #[must_use]
    pub fn merge(mut self, other: Router<State>) -> Self {
        self.inner = self.inner.merge(other);
        self
    }

    /// Consumes the `FluentRouter` and returns the underlying `axum::Router`.
    ///
    /// The cache sweeper started by `setup_optimizer()` stops with the
    /// `FluentRouter`; use [`start`](Self::start) to keep it running.
    pub fn into_inner(self) -> Router<State> {
        self.inner
    }
}

/// Completes on Ctrl+C or SIGTERM.
///
/// If a handler cannot be installed the function logs a warning and waits on
/// the other one.
async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => tracing::debug!("Ctrl+C signal received"),
            Err(err) => {
                tracing::warn!("Failed to install Ctrl+C handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal_handler) => {
                signal_handler.recv().await;
                tracing::debug!("SIGTERM signal received");
            }
            Err(err) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
