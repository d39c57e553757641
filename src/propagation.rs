//! W3C trace context propagation over HTTP headers.
//!
//! Incoming requests are linked to their caller by
//! [`FluentRouter::setup_tracing`](crate::FluentRouter::setup_tracing). Use
//! [`inject_current_context`] on outgoing requests so the next service joins
//! the same trace:
//!
//! ```rust,no_run
//! use axum_openapi_plus::propagation::inject_current_context;
//!
//! let mut headers = http::HeaderMap::new();
//! inject_current_context(&mut headers);
//! // headers now carry `traceparent` (and `tracestate` when set)
//! ```

use {
    http::{HeaderMap, HeaderName, HeaderValue},
    opentelemetry::{
        Context,
        propagation::{Extractor, Injector},
    },
    tracing_opentelemetry::OpenTelemetrySpanExt,
};

/// Read access to a header map for the text-map propagator.
pub struct HeaderExtractor<'a>(pub &'a HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|k| k.as_str()).collect()
    }
}

/// Write access to a header map for the text-map propagator.
pub struct HeaderInjector<'a>(pub &'a mut HeaderMap);

impl Injector for HeaderInjector<'_> {
    fn set(&mut self, key: &str, value: String) {
        match (HeaderName::from_bytes(key.as_bytes()), HeaderValue::from_str(&value)) {
            (Ok(name), Ok(value)) => {
                self.0.insert(name, value);
            }
            _ => tracing::debug!(key, "Dropping trace context field that is not a valid header"),
        }
    }
}

/// The remote context carried by `headers`, if any.
pub fn extract_context(headers: &HeaderMap) -> Context {
    opentelemetry::global::get_text_map_propagator(|propagator| {
        propagator.extract(&HeaderExtractor(headers))
    })
}

/// Writes the context of the current `tracing` span into `headers`.
pub fn inject_current_context(headers: &mut HeaderMap) {
    let context = tracing::Span::current().context();
    opentelemetry::global::get_text_map_propagator(|propagator| {
        propagator.inject_context(&context, &mut HeaderInjector(headers))
    });
}
