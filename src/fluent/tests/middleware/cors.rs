//! Tests for CORS middleware setup

use crate::fluent::tests::{create_base_config, create_test_router, options_request};
use crate::{Config, CorsHeader, CorsMethod, FluentRouter, HttpCorsConfig, Optimize};
use axum::{
    Router,
    body::Body,
    http::{HeaderName, Method, Request},
    response::Html,
    routing::get,
};
use std::time::Duration;
use tower::ServiceExt;

fn cors_config() -> HttpCorsConfig {
    HttpCorsConfig::default()
        .with_allowed_origins(vec!["https://app.example.com".to_string()])
        .with_allowed_methods(vec![CorsMethod(Method::GET), CorsMethod(Method::POST)])
        .with_allowed_headers(vec![CorsHeader(HeaderName::from_static("traceparent"))])
        .with_max_age(Duration::from_secs(600))
}

fn cross_origin_get(uri: &str, origin: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("Origin", origin)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_setup_cors_without_config_is_restrictive() {
    // RUST_ENV is unset in tests, which counts as production
    let app = FluentRouter::without_state(Config::default())
        .unwrap()
        .route("/test", get(|| async { "test" }))
        .setup_cors()
        .into_inner();

    let response = app
        .oneshot(options_request("/test", "https://example.com", "POST"))
        .await
        .unwrap();

    let allows_any = response
        .headers()
        .get("access-control-allow-origin")
        .is_some_and(|v| v == "*");
    assert!(!allows_any, "Production default should NOT allow all origins");
}

#[tokio::test]
async fn test_setup_cors_allowed_origin() {
    let config = Config::default().with_cors_config(cors_config());
    let app = FluentRouter::without_state(config)
        .unwrap()
        .route("/test", get(|| async { "test" }))
        .setup_cors()
        .into_inner();

    let response = app
        .clone()
        .oneshot(cross_origin_get("/test", "https://app.example.com"))
        .await
        .unwrap();
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "https://app.example.com"
    );

    let response = app
        .oneshot(cross_origin_get("/test", "https://evil.example.com"))
        .await
        .unwrap();
    assert!(response.headers().get("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn test_setup_cors_preflight() {
    let config = Config::default().with_cors_config(cors_config());
    let app = FluentRouter::without_state(config)
        .unwrap()
        .route("/test", get(|| async { "test" }))
        .setup_cors()
        .into_inner();

    let response = app
        .oneshot(options_request("/test", "https://app.example.com", "POST"))
        .await
        .unwrap();

    let headers = response.headers();
    assert_eq!(headers.get("access-control-max-age").unwrap(), "600");
    assert_eq!(headers.get("access-control-allow-headers").unwrap(), "traceparent");
    assert!(
        headers
            .get("access-control-allow-methods")
            .unwrap()
            .to_str()
            .unwrap()
            .contains("POST")
    );
}

#[tokio::test]
async fn test_setup_cors_with_credentials() {
    let config = Config::default().with_cors_config(
        HttpCorsConfig::default()
            .with_allowed_origins(vec!["https://app.example.com".to_string()])
            .with_allowed_methods(vec![CorsMethod(Method::GET)])
            .with_allow_credentials(),
    );
    let app = FluentRouter::without_state(config)
        .unwrap()
        .route("/test", get(|| async { "test" }))
        .setup_cors()
        .into_inner();

    let response = app
        .oneshot(cross_origin_get("/test", "https://app.example.com"))
        .await
        .unwrap();

    let headers = response.headers();
    assert_eq!(headers.get("access-control-allow-credentials").unwrap(), "true");
    assert_eq!(
        headers.get("access-control-allow-origin").unwrap(),
        "https://app.example.com"
    );
}

#[tokio::test]
async fn test_cached_responses_carry_cors_headers() {
    let config = create_base_config().with_cors_config(cors_config());
    let routes = Router::new().route(
        "/cached",
        get(|| async { Html("<p>cached</p>") }).layer(Optimize::cache()),
    );
    let app = create_test_router(Some(config), routes).await;

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(cross_origin_get("/cached", "https://app.example.com"))
            .await
            .unwrap();
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "https://app.example.com"
        );
    }
}
