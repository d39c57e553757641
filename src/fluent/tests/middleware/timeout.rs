//! Tests for request timeout middleware setup

use crate::{Config, FluentRouter, HttpMiddleware};
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
    routing::get,
};
use std::time::Duration;
use tower::Service;

fn sleepy_router() -> Router {
    Router::new().route(
        "/sleep",
        get(|| async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            "done"
        }),
    )
}

#[tokio::test]
async fn test_setup_timeout_with_slow_handler() {
    let config = Config::default().with_request_timeout(Duration::from_millis(50));
    let mut app = FluentRouter::without_state(config)
        .unwrap()
        .merge(sleepy_router())
        .setup_timeout()
        .into_inner();

    let response = app
        .call(Request::builder().uri("/sleep").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
}

#[tokio::test]
async fn test_setup_timeout_with_fast_handler() {
    let config = Config::default().with_request_timeout(Duration::from_secs(2));
    let mut app = FluentRouter::without_state(config)
        .unwrap()
        .merge(sleepy_router())
        .setup_timeout()
        .into_inner();

    let response = app
        .call(Request::builder().uri("/sleep").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_setup_timeout_excluded() {
    let config = Config::default()
        .with_request_timeout(Duration::from_millis(50))
        .with_excluded_middlewares(vec![HttpMiddleware::Timeout]);
    let mut app = FluentRouter::without_state(config)
        .unwrap()
        .merge(sleepy_router())
        .setup_timeout()
        .into_inner();

    let response = app
        .call(Request::builder().uri("/sleep").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
