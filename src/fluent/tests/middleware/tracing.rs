//! Tests for request tracing

use crate::fluent::tests::get_request;
use crate::{Config, FluentRouter};
use axum::{Router, routing::get};
use tower::ServiceExt;
use tracing_test::traced_test;

fn traced_app() -> Router {
    FluentRouter::without_state(Config::default())
        .unwrap()
        .route("/pets/{id}", get(|| async { "pet" }))
        .route("/metrics", get(|| async { "# metrics" }))
        .setup_tracing()
        .into_inner()
}

#[tokio::test]
#[traced_test]
async fn test_requests_get_server_span() {
    let response = traced_app().oneshot(get_request("/pets/7")).await.unwrap();
    assert!(response.status().is_success());

    assert!(logs_contain("finished processing request"));
    assert!(logs_contain("GET_/pets/7"));
    assert!(logs_contain("server"));
}

#[tokio::test]
#[traced_test]
async fn test_metrics_route_is_not_traced() {
    let response = traced_app().oneshot(get_request("/metrics")).await.unwrap();
    assert!(response.status().is_success());

    assert!(!logs_contain("started processing request"));
    assert!(!logs_contain("finished processing request"));
}
