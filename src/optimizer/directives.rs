use {
    super::{Content, ResponseOptimizer},
    crate::{Error, Result, cache::CachedResponse},
    axum::{
        extract::{FromRequestParts, OptionalFromRequestParts, Request},
        response::Response,
    },
    http::request::Parts,
    std::{
        convert::Infallible,
        fmt,
        future::Future,
        pin::Pin,
        sync::{
            Arc, Mutex, PoisonError,
            atomic::{AtomicBool, Ordering},
        },
        task::{Context, Poll},
        time::Duration,
    },
    tower::{Layer, Service},
};

/// Per-request optimizer settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptimizeDirectives {
    /// How long the response is cached. Zero disables caching.
    pub cache_timeout: Duration,
    pub skip_minify: bool,
    pub skip_compress: bool,
    /// Overrides the default `METHOD + URI` cache key.
    pub cache_key: Option<String>,
}

/// Handle on the optimizer state of the current request.
///
/// Inserted into the request extensions by the response optimizer and
/// available to handlers as an extractor:
///
/// ```rust
/// use axum_openapi_plus::OptimizeContext;
/// use std::time::Duration;
///
/// async fn report(ctx: OptimizeContext) -> String {
///     ctx.set_cache_timeout(Duration::from_secs(300));
///     ctx.do_not_minify();
///     "<pre>  report  </pre>".to_string()
/// }
/// ```
///
/// Extracting it fails with a 500 when the optimizer is not installed; use
/// `Option<OptimizeContext>` for handlers that run either way.
#[derive(Clone)]
pub struct OptimizeContext {
    inner: Arc<ContextState>,
}

struct ContextState {
    optimizer: ResponseOptimizer,
    default_key: String,
    accepts_gzip: bool,
    directives: Mutex<OptimizeDirectives>,
    served_from_cache: AtomicBool,
    cache_checked: AtomicBool,
    seeded_inline: AtomicBool,
}

impl OptimizeContext {
    pub(crate) fn new(optimizer: ResponseOptimizer, default_key: String, accepts_gzip: bool) -> Self {
        Self {
            inner: Arc::new(ContextState {
                optimizer,
                default_key,
                accepts_gzip,
                directives: Mutex::new(OptimizeDirectives::default()),
                served_from_cache: AtomicBool::new(false),
                cache_checked: AtomicBool::new(false),
                seeded_inline: AtomicBool::new(false),
            }),
        }
    }

    fn update<R>(&self, f: impl FnOnce(&mut OptimizeDirectives) -> R) -> R {
        let mut directives = self
            .inner
            .directives
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut directives)
    }

    /// Snapshot of the current directives.
    pub fn directives(&self) -> OptimizeDirectives {
        self.update(|d| d.clone())
    }

    /// The cache key of this request.
    pub fn key(&self) -> String {
        self.update(|d| d.cache_key.clone())
            .unwrap_or_else(|| self.inner.default_key.clone())
    }

    pub fn accepts_gzip(&self) -> bool {
        self.inner.accepts_gzip
    }

    /// Caches the response for `timeout`. Zero disables caching.
    pub fn set_cache_timeout(&self, timeout: Duration) {
        self.update(|d| d.cache_timeout = timeout);
    }

    /// Caches the response for the configured default duration.
    pub fn cache_default(&self) {
        let timeout = self.inner.optimizer.config().default_cache_timeout;
        self.set_cache_timeout(timeout);
    }

    pub fn do_not_minify(&self) {
        self.update(|d| d.skip_minify = true);
    }

    pub fn do_not_compress(&self) {
        self.update(|d| d.skip_compress = true);
    }

    pub fn set_key(&self, key: impl Into<String>) {
        let key = key.into();
        self.update(|d| d.cache_key = Some(key));
    }

    /// Writes `content` into the cache under the current key without
    /// serving it to this request.
    ///
    /// The handler's own response is still optimized and returned, but it is
    /// not stored, so the seeded entry is what later requests are served.
    /// With `ttl` the entry expires after it; without, an existing entry
    /// keeps its expiry and a new one uses the request's cache timeout (or
    /// the configured default when none is set).
    pub async fn set_cache_inline(&self, content: impl Into<Content>, ttl: Option<Duration>) -> Result<()> {
        let value = content.into().into_cached()?;
        self.inner.seeded_inline.store(true, Ordering::Release);
        let key = self.key();
        let cache = self.inner.optimizer.cache();
        match ttl {
            Some(ttl) => {
                cache.store(&key, value, ttl).await;
                Ok(())
            }
            None => {
                let timeout = match self.directives().cache_timeout {
                    timeout if timeout.is_zero() => self.inner.optimizer.config().default_cache_timeout,
                    timeout => timeout,
                };
                cache.seed(&key, value, timeout).await
            }
        }
    }

    /// Removes the cached value and expiry of the current key, returning
    /// the previous value.
    pub async fn clear_key(&self) -> Result<Option<CachedResponse>> {
        self.inner.optimizer.cache().clear_key(&self.key()).await
    }

    /// True when the response was answered from the cache before the
    /// handler ran.
    pub fn served_from_cache(&self) -> bool {
        self.inner.served_from_cache.load(Ordering::Acquire)
    }

    pub(crate) fn mark_served_from_cache(&self) {
        self.inner.served_from_cache.store(true, Ordering::Release);
    }

    /// True once the cache was queried for this request.
    pub(crate) fn cache_checked(&self) -> bool {
        self.inner.cache_checked.load(Ordering::Acquire)
    }

    /// True when the handler wrote the cache with
    /// [`set_cache_inline`](Self::set_cache_inline).
    pub(crate) fn seeded_inline(&self) -> bool {
        self.inner.seeded_inline.load(Ordering::Acquire)
    }

    pub(crate) fn apply(&self, optimize: &Optimize) {
        let default_timeout = self.inner.optimizer.config().default_cache_timeout;
        self.update(|d| {
            match optimize.cache_timeout {
                Some(CacheTimeout::Default) => d.cache_timeout = default_timeout,
                Some(CacheTimeout::For(timeout)) => d.cache_timeout = timeout,
                None => {}
            }
            d.skip_minify |= optimize.skip_minify;
            d.skip_compress |= optimize.skip_compress;
            if let Some(key) = &optimize.key {
                d.cache_key = Some(key.clone());
            }
        });
    }

    /// The cached response for this request, when caching is enabled and a
    /// usable entry exists.
    pub(crate) async fn cached_response(&self) -> Option<CachedResponse> {
        if self.directives().cache_timeout.is_zero() {
            return None;
        }
        self.inner.cache_checked.store(true, Ordering::Release);
        self.inner
            .optimizer
            .check_cache(&self.key(), self.accepts_gzip())
            .await
    }
}

impl fmt::Debug for OptimizeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptimizeContext")
            .field("key", &self.key())
            .field("accepts_gzip", &self.inner.accepts_gzip)
            .field("directives", &self.directives())
            .field("served_from_cache", &self.served_from_cache())
            .finish()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for OptimizeContext {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        parts
            .extensions
            .get::<OptimizeContext>()
            .cloned()
            .ok_or_else(|| Error::internal("the response optimizer is not installed"))
    }
}

impl<S: Send + Sync> OptionalFromRequestParts<S> for OptimizeContext {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<OptimizeContext>().cloned())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CacheTimeout {
    Default,
    For(Duration),
}

/// Optimizer directives for a single route, applied as a layer.
///
/// ```rust
/// use axum::{Router, routing::get};
/// use axum_openapi_plus::Optimize;
/// use std::time::Duration;
///
/// async fn page() -> &'static str { "<p>hi</p>" }
///
/// let app: Router = Router::new()
///     .route("/page", get(page).layer(Optimize::cache_for(Duration::from_secs(60)).without_minify()))
///     .route("/raw", get(page).layer(Optimize::skip_compress()));
/// ```
///
/// When a cache duration is set the cache is checked before the handler
/// runs and a hit answers the request directly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Optimize {
    cache_timeout: Option<CacheTimeout>,
    skip_minify: bool,
    skip_compress: bool,
    key: Option<String>,
}

impl Optimize {
    pub fn new() -> Self {
        Self::default()
    }

    /// Caches responses for `timeout`.
    pub fn cache_for(timeout: Duration) -> Self {
        Self::new().with_cache_for(timeout)
    }

    /// Caches responses for the configured default duration.
    pub fn cache() -> Self {
        Self::new().with_cache()
    }

    pub fn skip_minify() -> Self {
        Self::new().without_minify()
    }

    pub fn skip_compress() -> Self {
        Self::new().without_compress()
    }

    /// Uses `key` instead of `METHOD + URI` as the cache key.
    pub fn key(key: impl Into<String>) -> Self {
        Self::new().with_key(key)
    }

    pub fn with_cache_for(mut self, timeout: Duration) -> Self {
        self.cache_timeout = Some(CacheTimeout::For(timeout));
        self
    }

    pub fn with_cache(mut self) -> Self {
        self.cache_timeout = Some(CacheTimeout::Default);
        self
    }

    pub fn without_minify(mut self) -> Self {
        self.skip_minify = true;
        self
    }

    pub fn without_compress(mut self) -> Self {
        self.skip_compress = true;
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }
}

impl<S> Layer<S> for Optimize {
    type Service = OptimizeService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        OptimizeService {
            inner,
            optimize: self.clone(),
        }
    }
}

/// Service applying [`Optimize`] directives.
#[derive(Debug, Clone)]
pub struct OptimizeService<S> {
    inner: S,
    optimize: Optimize,
}

impl<S> Service<Request> for OptimizeService<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = std::result::Result<Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let context = req.extensions().get::<OptimizeContext>().cloned();
        let optimize = self.optimize.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let Some(context) = context else {
                tracing::debug!("Optimize directives ignored, the response optimizer is not installed");
                return inner.call(req).await;
            };

            context.apply(&optimize);
            if let Some(hit) = context.cached_response().await {
                tracing::debug!(key = %context.key(), "Serving cached response");
                context.mark_served_from_cache();
                return Ok(hit.into_response());
            }
            inner.call(req).await
        })
    }
}
