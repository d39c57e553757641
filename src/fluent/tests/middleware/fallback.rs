//! Tests for the JSON 404 fallback

use crate::fluent::tests::{create_test_router, get_body_string, get_request};
use crate::{Config, FluentRouter, HttpMiddleware};
use axum::{Router, http::StatusCode};
use tower::ServiceExt;

#[tokio::test]
async fn test_unmatched_route_returns_json_404() {
    let app = create_test_router(None, Router::new()).await;

    let response = app.oneshot(get_request("/does/not/exist")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body: serde_json::Value = serde_json::from_str(&get_body_string(response).await).unwrap();
    assert_eq!(body["status"], 404);
    assert_eq!(body["error_code"], "NOT_FOUND");
    assert_eq!(body["message"], "No route for /does/not/exist");
}

#[tokio::test]
async fn test_fallback_can_be_excluded() {
    let config = Config::default().with_excluded_middlewares(vec![HttpMiddleware::Fallback]);
    let app = FluentRouter::without_state(config)
        .unwrap()
        .setup_fallback()
        .into_inner();

    let response = app.oneshot(get_request("/missing")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(get_body_string(response).await.is_empty());
}
