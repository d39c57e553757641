//! Observability middleware: request tracing, metrics, and OpenTelemetry export.

use super::router::FluentRouter;
use crate::HttpMiddleware;

use {
    axum::body::Body,
    http::{Request, Response},
    std::time::Duration,
    tower_http::trace::TraceLayer as TowerHTTPLayer,
    tracing::Span,
};

#[cfg(feature = "metrics")]
use axum_prometheus::PrometheusMetricLayerBuilder;

#[cfg(feature = "opentelemetry")]
use {
    crate::{Error, Result},
    opentelemetry::{global, trace::TracerProvider},
    opentelemetry_otlp::WithExportConfig,
    opentelemetry_sdk::{
        Resource,
        trace::{RandomIdGenerator, Sampler},
    },
    tracing_opentelemetry::OpenTelemetrySpanExt,
};

/// Name of the server span of a request: `"{METHOD}_{path}"`.
pub(crate) fn span_name<B>(request: &Request<B>) -> String {
    format!("{}_{}", request.method(), request.uri().path())
}

impl<State> FluentRouter<State>
where
    State: Clone + Send + Sync + 'static,
{
    /// Sets up Prometheus metrics collection and endpoint.
    ///
    /// When `config.http.with_metrics` is true, this method adds the metrics
    /// endpoint at the configured route (default: `/metrics`) and installs the
    /// collection middleware. The metrics route itself is not measured.
    ///
    /// ```toml
    /// [http]
    /// with_metrics = true
    /// metrics_route = "/metrics"
    /// ```
    ///
    /// Disable metrics in tests to avoid conflicts with the global Prometheus
    /// registry:
    ///
    /// ```rust
    /// # use axum_openapi_plus::Config;
    /// let config = Config::default().with_metrics(false);
    /// ```
    #[cfg(feature = "metrics")]
    #[must_use]
    pub fn setup_metrics(mut self) -> Self {
        if self.config.http.with_metrics && self.is_middleware_enabled(HttpMiddleware::Metrics) {
            const PACKAGE_NAME: &str = env!("CARGO_PKG_NAME");
            let metrics_path: &str =
                Box::leak(self.config.http.metrics_route.clone().into_boxed_str());
            let (prometheus_layer, metrics_handle) = PrometheusMetricLayerBuilder::new()
                .enable_response_body_size(true)
                .with_prefix(PACKAGE_NAME)
                .with_ignore_pattern(metrics_path)
                .with_default_metrics()
                .build_pair();

            self.inner = self
                .inner
                .route(metrics_path, axum::routing::get(|| async move { metrics_handle.render() }))
                .layer(prometheus_layer);
        }
        self
    }

    /// No-op when `metrics` feature is disabled.
    #[cfg(not(feature = "metrics"))]
    #[must_use]
    pub fn setup_metrics(self) -> Self {
        if self.config.http.with_metrics {
            tracing::warn!(
                "Metrics are enabled in config but the 'metrics' feature is not enabled. \
                 Add `metrics` to your Cargo.toml features to enable metrics support."
            );
        }
        self
    }

    /// Wraps every request in a server span named `"{METHOD}_{path}"`.
    ///
    /// The span carries `otel.name` and `otel.kind = "server"` so the
    /// OpenTelemetry bridge exports it under that name. When the
    /// `opentelemetry` feature is enabled, the parent context is extracted from
    /// the incoming `traceparent`/`tracestate` headers.
    ///
    /// Requests to `http.metrics_route` get no span and no request/response
    /// events.
    #[must_use]
    pub fn setup_tracing(mut self) -> Self {
        if !self.is_middleware_enabled(HttpMiddleware::Tracing) {
            return self;
        }

        let metrics_route = self.config.http.metrics_route.clone();
        self.inner = self.inner.layer(
            TowerHTTPLayer::new_for_http()
                .make_span_with(move |request: &Request<Body>| {
                    if request.uri().path() == metrics_route {
                        return Span::none();
                    }

                    let name = span_name(request);
                    let span = tracing::info_span!(
                        "http_request",
                        otel.name = %name,
                        otel.kind = "server",
                        span.kind = "server",
                        method = %request.method(),
                        uri = %request.uri(),
                        status = tracing::field::Empty,
                    );

                    #[cfg(feature = "opentelemetry")]
                    {
                        let context = crate::propagation::extract_context(request.headers());
                        let _ = span.set_parent(context);
                    }

                    span
                })
                .on_request(|request: &Request<Body>, span: &Span| {
                    if !span.is_disabled() {
                        tracing::debug!(parent: span, path = request.uri().path(), "started processing request");
                    }
                })
                .on_response(|response: &Response<Body>, latency: Duration, span: &Span| {
                    if span.is_disabled() {
                        return;
                    }
                    span.record("status", response.status().as_u16());
                    tracing::info!(
                        parent: span,
                        status = response.status().as_u16(),
                        latency = %humantime::format_duration(latency),
                        "finished processing request"
                    );
                }),
        );

        self
    }

    /// Initializes OpenTelemetry distributed tracing with W3C Trace Context propagation.
    ///
    /// Sets up OTLP export to a collector and installs the global subscriber:
    /// the configured log format, the `EnvFilter`, and the OpenTelemetry
    /// bridge. Call this instead of [`Config::setup_tracing`](crate::Config::setup_tracing)
    /// when `[logging.opentelemetry]` is configured.
    ///
    /// ```toml
    /// [logging.opentelemetry]
    /// endpoint = "http://localhost:4317"
    /// service_name = "my-service"
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if the OTLP exporter cannot be built.
    #[cfg(feature = "opentelemetry")]
    pub fn setup_opentelemetry(self) -> Result<Self> {
        let Some(otel_config) = &self.config.logging.opentelemetry else {
            self.config.setup_tracing();
            return Ok(self);
        };

        use tracing_subscriber::prelude::*;

        let service_name = otel_config
            .service_name
            .clone()
            .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string());

        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .with_endpoint(&otel_config.endpoint)
            .build()
            .map_err(|e| Error::internal(format!("Failed to create OTLP exporter: {}", e)))?;

        let sampler = match otel_config.sample_ratio {
            Some(ratio) => Sampler::ParentBased(Box::new(Sampler::TraceIdRatioBased(ratio))),
            None => Sampler::AlwaysOn,
        };

        let provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
            .with_batch_exporter(exporter)
            .with_id_generator(RandomIdGenerator::default())
            .with_sampler(sampler)
            .with_resource(
                Resource::builder()
                    .with_service_name(service_name.clone())
                    .build(),
            )
            .build();

        global::set_tracer_provider(provider.clone());
        global::set_text_map_propagator(
            opentelemetry_sdk::propagation::TraceContextPropagator::new(),
        );

        let tracer = provider.tracer(service_name);
        let _ = tracing_subscriber::registry()
            .with(tracing_opentelemetry::layer().with_tracer(tracer))
            .with(self.config.logging.fmt_layer())
            .with(self.config.logging.env_filter())
            .try_init();

        tracing::info!(
            endpoint = %otel_config.endpoint,
            "OpenTelemetry tracing initialized with context propagation"
        );
        Ok(self)
    }
}
