//! Tests for panic catching middleware setup

use crate::fluent::tests::get_body_string;
use crate::{Config, FluentRouter};
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
    routing::get,
};
use tower::Service;

fn panic_router() -> Router {
    Router::new()
        .route(
            "/panic",
            get(|| async {
                panic!("Test panic!");
                #[allow(unreachable_code)]
                "This will never be reached"
            }),
        )
        .route("/normal", get(|| async { "OK" }))
}

#[tokio::test]
async fn test_setup_catch_panic_with_panic() {
    let mut app = FluentRouter::without_state(Config::default())
        .unwrap()
        .merge(panic_router())
        .setup_catch_panic()
        .into_inner();

    let response = app
        .call(Request::builder().uri("/panic").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );

    let body: serde_json::Value = serde_json::from_str(&get_body_string(response).await).unwrap();
    assert_eq!(body["status"], 500);
    assert_eq!(body["error_code"], "INTERNAL_ERROR");
    assert_eq!(body["message"], "Internal Server Error");
}

#[tokio::test]
async fn test_setup_catch_panic_normal_request() {
    let mut app = FluentRouter::without_state(Config::default())
        .unwrap()
        .merge(panic_router())
        .setup_catch_panic()
        .into_inner();

    let response = app
        .call(Request::builder().uri("/normal").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(get_body_string(response).await, "OK");
}

#[tokio::test]
async fn test_panic_notification_channel() {
    let (tx, mut rx) = tokio::sync::mpsc::channel(4);
    let mut app = FluentRouter::without_state(Config::default())
        .unwrap()
        .with_panic_notification_channel(tx)
        .merge(panic_router())
        .setup_catch_panic()
        .into_inner();

    let _ = app
        .call(Request::builder().uri("/panic").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(rx.recv().await.unwrap(), "Test panic!");
}
