use {
    super::{OptimizeContext, ResponseOptimizer, accepts_gzip_header},
    crate::cache::CachedResponse,
    axum::{extract::Request, response::IntoResponse, response::Response},
    http::header,
    http_body::Body as _,
    std::{
        future::Future,
        pin::Pin,
        task::{Context, Poll},
    },
    tower::{Layer, Service},
};

/// Layer installing the response optimizer.
#[derive(Clone, Debug)]
pub struct ResponseOptimizerLayer {
    optimizer: ResponseOptimizer,
}

impl ResponseOptimizerLayer {
    pub fn new(optimizer: ResponseOptimizer) -> Self {
        Self { optimizer }
    }
}

impl<S> Layer<S> for ResponseOptimizerLayer {
    type Service = ResponseOptimizerService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ResponseOptimizerService {
            inner,
            optimizer: self.optimizer.clone(),
        }
    }
}

/// Service running the optimizer pipeline on every response.
#[derive(Clone, Debug)]
pub struct ResponseOptimizerService<S> {
    inner: S,
    optimizer: ResponseOptimizer,
}

impl<S> Service<Request> for ResponseOptimizerService<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let default_key = format!("{}{}", req.method(), req.uri());
        let context = OptimizeContext::new(
            self.optimizer.clone(),
            default_key,
            accepts_gzip_header(req.headers()),
        );
        req.extensions_mut().insert(context.clone());

        let optimizer = self.optimizer.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let response = inner.call(req).await?;
            if context.served_from_cache() {
                return Ok(response);
            }
            Ok(optimizer.process(response, &context).await)
        })
    }
}

impl ResponseOptimizer {
    /// Runs the pipeline on a handler response.
    ///
    /// The cache is only checked here when the handler enabled caching
    /// inline; a route layer has already checked it otherwise. A request
    /// that seeded the cache inline is answered with its own response and
    /// leaves the seeded entry in place.
    async fn process(&self, response: Response, context: &OptimizeContext) -> Response {
        let directives = context.directives();
        let ttl = directives.cache_timeout;
        let key = context.key();
        let seeded = context.seeded_inline();

        if !ttl.is_zero()
            && !seeded
            && !context.cache_checked()
            && let Some(hit) = self.check_cache(&key, context.accepts_gzip()).await
        {
            tracing::debug!(key, "Serving cached response");
            return hit.into_response();
        }

        let is_html = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(crate::cache::is_html_content_type);
        let encoded = response.headers().contains_key(header::CONTENT_ENCODING);
        let minify = self.should_minify(&directives) && is_html && !encoded;
        let compress = self.should_compress(&directives, context.accepts_gzip()) && !encoded;
        let store = !ttl.is_zero() && !seeded && response.status().is_success();
        if !(minify || compress || store) {
            return response;
        }

        let limit = self.config().max_buffer_size.as_u64();
        match response.body().size_hint().upper() {
            Some(upper) if upper <= limit => {}
            upper => {
                tracing::debug!(?upper, limit, "Response body too large to optimize, passing through");
                return response;
            }
        }

        let snapshot = match CachedResponse::from_response(response).await {
            Ok(snapshot) => snapshot,
            Err(error) => return error.into_response(),
        };
        let optimized = self.optimize(snapshot, &directives, context.accepts_gzip());
        if store {
            self.store_cache(&key, optimized.clone(), ttl).await;
        }
        optimized.into_response()
    }
}
