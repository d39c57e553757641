//! Tests for middleware configuration (include/exclude)

use crate::fluent::tests::{create_base_config, get_request};
use crate::{Config, FluentRouter, HttpMiddleware};
use axum::{Router, http::StatusCode, routing::get};
use tower::ServiceExt;

#[tokio::test]
async fn test_middleware_config_include() {
    let config = Config::default()
        .with_included_middlewares(vec![HttpMiddleware::Tracing, HttpMiddleware::CatchPanic]);

    let fluent_router = FluentRouter::without_state(config).unwrap();

    assert!(fluent_router.is_middleware_enabled(HttpMiddleware::Tracing));
    assert!(fluent_router.is_middleware_enabled(HttpMiddleware::CatchPanic));
    assert!(!fluent_router.is_middleware_enabled(HttpMiddleware::Optimizer));
    assert!(!fluent_router.is_middleware_enabled(HttpMiddleware::Cors));
    assert!(!fluent_router.is_middleware_enabled(HttpMiddleware::Fallback));

    let app = fluent_router
        .merge(Router::new().route("/test", get(|| async { "OK" })))
        .setup_middleware()
        .await
        .unwrap()
        .into_inner();

    let response = app.oneshot(get_request("/test")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_middleware_config_default_all_enabled() {
    let fluent_router = FluentRouter::without_state(Config::default()).unwrap();

    assert!(fluent_router.is_middleware_enabled(HttpMiddleware::Optimizer));
    assert!(fluent_router.is_middleware_enabled(HttpMiddleware::Tracing));
    assert!(fluent_router.is_middleware_enabled(HttpMiddleware::Metrics));
    assert!(fluent_router.is_middleware_enabled(HttpMiddleware::Fallback));
}

#[tokio::test]
async fn test_optimizer_installed_from_config() {
    let router = FluentRouter::without_state(create_base_config())
        .unwrap()
        .setup_optimizer()
        .await;
    assert_eq!(router.optimizer().unwrap().cache().backend(), "memory");

    let router = FluentRouter::without_state(Config::default().with_metrics(false))
        .unwrap()
        .setup_optimizer()
        .await;
    assert!(router.optimizer().is_none());
}

#[tokio::test]
async fn test_injected_optimizer_wins_over_config() {
    use crate::{HttpOptimizerConfig, ResponseCache, ResponseOptimizer};

    let injected = ResponseOptimizer::new(
        HttpOptimizerConfig::default().with_minify(false),
        ResponseCache::in_memory(),
    );
    let router = FluentRouter::without_state(create_base_config())
        .unwrap()
        .with_response_optimizer(injected)
        .setup_optimizer()
        .await;
    assert!(!router.optimizer().unwrap().config().minify);
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = Config::default().with_bind_addr("not an ip");
    assert!(FluentRouter::without_state(config).is_err());
}
