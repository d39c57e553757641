//! Core FluentRouter struct and initialization methods.

use {
    crate::{Config, HttpMiddleware, Result, optimizer::ResponseOptimizer},
    axum::Router,
    tokio_util::task::AbortOnDropHandle,
};

/// Fluent builder for axum::Router with configuration-based middleware setup.
///
/// This wrapper around `axum::Router` provides a fluent API for mounting
/// OpenAPI operations and configuring middleware based on the application
/// configuration. Create instances using [`FluentRouter::without_state`] or
/// [`FluentRouter::with_state`].
///
/// The router forwards layering and nesting calls to the underlying
/// `axum::Router`, allowing middleware to be set up at any stage through
/// dedicated `setup_*` methods.
///
/// ```rust,no_run
/// use axum_openapi_plus::{Config, FluentRouter, HandlerRegistry, MultipleResourceResolver};
/// use axum_openapi_plus::openapi::ApiSpec;
///
/// async fn list_pets() -> &'static str { "[]" }
///
/// # async fn example() -> axum_openapi_plus::Result<()> {
/// let config = Config::default();
/// let spec = ApiSpec::from_file("openapi.yaml")?;
/// let registry = HandlerRegistry::new().with_handler("api.Pets.search", list_pets);
///
/// FluentRouter::without_state(config)?
///     .add_api(&spec, &MultipleResourceResolver::default(), &registry)?
///     .setup_middleware()
///     .await?
///     .start()
///     .await
/// # }
/// ```
pub struct FluentRouter<State = ()> {
    pub(crate) config: Config,
    pub(crate) state: State,
    pub(crate) inner: Router<State>,
    pub(crate) panic_channel: Option<tokio::sync::mpsc::Sender<String>>,
    pub(crate) optimizer: Option<ResponseOptimizer>,
    pub(crate) sweeper_handle: Option<AbortOnDropHandle<()>>,
}

impl FluentRouter {
    /// Creates a new `FluentRouter` without application state.
    pub fn without_state(config: Config) -> Result<FluentRouter<()>> {
        FluentRouter::<()>::with_state(config, ())
    }
}

impl<State> FluentRouter<State>
where
    State: Clone + Send + Sync + 'static,
{
    /// Creates a new `FluentRouter` with the provided configuration and state.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration validation fails.
    pub fn with_state<S: Clone + Send + Sync + 'static>(
        config: Config,
        state: S,
    ) -> Result<FluentRouter<S>> {
        config.validate()?;

        Ok(FluentRouter {
            config,
            state,
            inner: Router::new(),
            panic_channel: None,
            optimizer: None,
            sweeper_handle: None,
        })
    }

    /// The configuration this router was built from.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The response optimizer, once installed by `setup_optimizer()` or
    /// injected with `with_response_optimizer()`.
    ///
    /// Handy to seed or clear cache entries from outside a request.
    pub fn optimizer(&self) -> Option<&ResponseOptimizer> {
        self.optimizer.as_ref()
    }

    /// Helper method to check if a middleware is enabled in the configuration.
    /// Returns true if no middleware config is specified (all enabled by default),
    /// or if the middleware is explicitly enabled/not excluded.
    pub(crate) fn is_middleware_enabled(&self, middleware: HttpMiddleware) -> bool {
        self.config
            .http
            .middleware
            .as_ref()
            .map(|config| config.is_enabled(middleware))
            .unwrap_or(true)
    }

    /// Sets a notification channel for panic messages.
    ///
    /// When configured, any panics caught by the panic handler middleware will
    /// send a message to this channel.
    ///
    /// ```rust,no_run
    /// # use axum_openapi_plus::{Config, FluentRouter};
    /// # async fn example() -> axum_openapi_plus::Result<()> {
    /// let (tx, mut rx) = tokio::sync::mpsc::channel(100);
    ///
    /// let router = FluentRouter::without_state(Config::default())?
    ///     .with_panic_notification_channel(tx);
    ///
    /// tokio::spawn(async move {
    ///     while let Some(panic_msg) = rx.recv().await {
    ///         eprintln!("Panic caught: {}", panic_msg);
    ///     }
    /// });
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn with_panic_notification_channel(self, ch: tokio::sync::mpsc::Sender<String>) -> Self {
        Self {
            panic_channel: Some(ch),
            ..self
        }
    }

    /// Uses `optimizer` instead of building one from `[http.optimizer]`.
    ///
    /// This is how a custom [`CacheStore`](crate::cache::CacheStore) is
    /// plugged in.
    #[must_use]
    pub fn with_response_optimizer(self, optimizer: ResponseOptimizer) -> Self {
        Self {
            optimizer: Some(optimizer),
            ..self
        }
    }
}
