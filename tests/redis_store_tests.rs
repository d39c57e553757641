//! Integration tests for the Redis cache store
//!
//! These tests start a Redis container, so they need a running Docker daemon.
//! Run with `cargo test --features redis --test redis_store_tests`.

#![cfg(feature = "redis")]

use axum_openapi_plus::{
    CachedResponse, OptimizerCacheConfig, ResponseCache,
    cache::{CacheStore, RedisStore, store_from_config},
};
use std::{sync::Arc, time::Duration};
use testcontainers_modules::{redis::Redis, testcontainers::runners::AsyncRunner};

async fn redis_url(container: &testcontainers::ContainerAsync<Redis>) -> String {
    format!(
        "redis://{}:{}",
        container.get_host().await.unwrap(),
        container.get_host_port_ipv4(6379).await.unwrap()
    )
}

#[tokio::test]
async fn test_redis_store_round_trip() {
    let redis_server = Redis::default()
        .start()
        .await
        .expect("Could not start redis server");
    let url = redis_url(&redis_server).await;

    let store = RedisStore::connect(&url, "test-round-trip")
        .await
        .expect("Failed to connect to redis");
    let cache = ResponseCache::new(Arc::new(store));
    assert_eq!(cache.backend(), "redis");

    cache
        .store("GET/pets", CachedResponse::html("<p>pets</p>"), Duration::from_secs(60))
        .await;
    let entry = cache.lookup("GET/pets").await.expect("Entry should be cached");
    assert_eq!(entry.value.body().as_ref(), b"<p>pets</p>");
    assert!(entry.value.is_html());

    let cleared = cache.clear_key("GET/pets").await.unwrap();
    assert!(cleared.is_some());
    assert!(cache.lookup("GET/pets").await.is_none());
}

#[tokio::test]
async fn test_redis_store_expiry_and_sweep() {
    let redis_server = Redis::default()
        .start()
        .await
        .expect("Could not start redis server");
    let url = redis_url(&redis_server).await;

    let store = RedisStore::connect(&url, "test-sweep")
        .await
        .expect("Failed to connect to redis");
    let cache = ResponseCache::new(Arc::new(store.clone()));

    cache
        .store("GET/old", CachedResponse::html("old"), Duration::from_millis(50))
        .await;
    cache
        .store("GET/new", CachedResponse::html("new"), Duration::from_secs(60))
        .await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(cache.sweep_expired().await.unwrap(), 1);
    let keys: Vec<String> = store
        .entries()
        .await
        .unwrap()
        .into_iter()
        .map(|(key, _)| key)
        .collect();
    assert_eq!(keys, vec!["GET/new".to_string()]);
}

#[tokio::test]
async fn test_store_from_config_uses_redis() {
    let redis_server = Redis::default()
        .start()
        .await
        .expect("Could not start redis server");
    let url = redis_url(&redis_server).await;

    let config = OptimizerCacheConfig::default().with_redis_url(url);
    let store = store_from_config(&config).await;
    assert_eq!(store.backend(), "redis");
}

#[tokio::test]
async fn test_unreachable_redis_falls_back_to_memory() {
    let config = OptimizerCacheConfig::default().with_redis_url("redis://127.0.0.1:1");
    let store = store_from_config(&config).await;
    assert_eq!(store.backend(), "memory");

    let cache = ResponseCache::new(store);
    cache
        .store("GET/pets", CachedResponse::html("<p>pets</p>"), Duration::from_secs(60))
        .await;
    assert!(cache.lookup("GET/pets").await.is_some());
}
