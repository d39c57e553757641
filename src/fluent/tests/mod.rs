//! Test helpers and utilities for FluentRouter tests
//!
//! These tests use `oneshot()` for fast, in-process testing without network I/O.
//! Tests that need real infrastructure (Redis) live in `tests/`.
//!
//! ## Available Helpers
//!
//! - Configuration builders: `create_base_config()`, `create_config_with_toml()`
//! - Router builders: `create_test_router()`
//! - Request helpers: `get_request()`, `gzip_request()`, `options_request()`
//! - Response helpers: `get_body_string()`, `gunzip_body()`

use crate::{Config, FluentRouter};
use axum::{Router, body::Body, http::Request, response::Response, routing::get};
use flate2::read::GzDecoder;
use std::io::Read;

#[cfg(test)]
pub(crate) mod middleware;

// ============================================================================
// Configuration Helpers
// ============================================================================

/// Base TOML configuration template for tests.
const BASE_CONFIG_TOML: &str = r#"
[http]
bind_addr = "127.0.0.1"
bind_port = 3000
with_metrics = false
metrics_route = "/metrics"

[http.optimizer]
minify = true
compress = true
default_cache_timeout = "1h"
max_buffer_size = "1MiB"

[logging]
format = "json"
"#;

/// Creates a base test configuration by parsing TOML.
/// The response optimizer is enabled with its in-memory store.
pub(crate) fn create_base_config() -> Config {
    BASE_CONFIG_TOML
        .parse()
        .expect("Failed to parse test config TOML")
}

/// Creates a test configuration with additional TOML sections injected
/// after `[http]`. The optimizer is only enabled if the sections say so.
pub(crate) fn create_config_with_toml(additional_toml: &str) -> Config {
    let toml_str = format!(
        r#"
[http]
bind_addr = "127.0.0.1"
bind_port = 3000
with_metrics = false

{additional_toml}

[logging]
format = "json"
        "#
    );

    toml_str.parse().expect("Failed to parse test config TOML")
}

// ============================================================================
// Router Helpers
// ============================================================================

/// Creates a test router with the full middleware stack around `routes`.
pub(crate) async fn create_test_router(config: Option<Config>, routes: Router) -> Router {
    let config = config.unwrap_or_else(create_base_config).with_metrics(false);

    FluentRouter::without_state(config)
        .expect("Failed to create FluentRouter")
        .merge(routes)
        .merge(Router::new().route("/noop", get(|| async { "OK\n" })))
        .setup_middleware()
        .await
        .expect("Failed to setup middleware")
        .into_inner()
}

// ============================================================================
// Request Helpers
// ============================================================================

/// Creates a GET request to the specified URI.
pub(crate) fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Creates a GET request from a client accepting gzip.
pub(crate) fn gzip_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("accept-encoding", "gzip, deflate, br")
        .body(Body::empty())
        .unwrap()
}

/// Creates an OPTIONS preflight request for CORS testing.
#[allow(dead_code)]
pub(crate) fn options_request(uri: &str, origin: &str, method: &str) -> Request<Body> {
    Request::builder()
        .method("OPTIONS")
        .uri(uri)
        .header("Origin", origin)
        .header("Access-Control-Request-Method", method)
        .body(Body::empty())
        .unwrap()
}

// ============================================================================
// Response Helpers
// ============================================================================

/// Extracts the body from a response as a String.
pub(crate) async fn get_body_string(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8_lossy(&body).to_string()
}

/// Extracts and decompresses a gzip encoded body.
pub(crate) async fn gunzip_body(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let mut out = String::new();
    GzDecoder::new(&body[..]).read_to_string(&mut out).unwrap();
    out
}
