//! # axum-openapi-plus
//!
//! OpenAPI-driven Axum services configured through TOML.
//!
//! * Operations of an OpenAPI document are mapped to handlers by REST
//!   conventions, including nested resources
//!   (`GET /pets/{id}/toys` resolves to `api.Pets.Toys.search`).
//! * Responses can be minified, gzip compressed and cached, per route or from
//!   inside the handler, with an in-memory or Redis cache store.
//! * Request spans, Prometheus metrics, CORS, timeouts and panic recovery are
//!   installed from configuration.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use axum::extract::Path;
//! use axum_openapi_plus::{
//!     Config, FluentRouter, HandlerRegistry, MultipleResourceResolver, Optimize, Result,
//!     openapi::ApiSpec,
//! };
//! use axum::routing::on;
//! use std::time::Duration;
//!
//! async fn list_pets() -> &'static str {
//!     "<ul><li>Rex</li></ul>"
//! }
//!
//! async fn get_pet(Path(id): Path<u32>) -> String {
//!     format!("<p>Pet {id}</p>")
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::default(); // Loads from config/{RUST_ENV}.toml
//!     config.setup_tracing();
//!
//!     let registry = HandlerRegistry::new()
//!         .with_factory("api.Pets.search", |filter| {
//!             on(filter, list_pets).layer(Optimize::cache_for(Duration::from_secs(60)))
//!         })
//!         .with_handler("api.Pets.get", get_pet);
//!
//!     let spec = ApiSpec::from_file("openapi.yaml")?;
//!     FluentRouter::without_state(config)?
//!         .add_api(&spec, &MultipleResourceResolver::default(), &registry)?
//!         .setup_middleware()
//!         .await?
//!         .start()
//!         .await
//! }
//! ```
//!
//! With `config/dev.toml`:
//!
//! ```toml
//! [http]
//! bind_port = 3000
//!
//! [http.optimizer]
//! minify = true
//! compress = true
//! default_cache_timeout = "24h"
//! ```
//!
//! Run with `RUST_ENV=dev cargo run`.
//!
//! # Cargo Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `redis` | Redis cache store (falls back to memory when unreachable) |
//! | `remote-specs` | Load OpenAPI documents from http(s) URLs |
//! | `metrics` | Prometheus endpoint |
//! | `cors` | CORS middleware |
//! | `opentelemetry` | OTLP span export and W3C trace context propagation |
//!
//! # Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`resolver`] | Operation identifiers and the handler registry |
//! | [`optimizer`] | Minify, compress and cache stages, route layer and middleware |
//! | [`cache`] | Cache entries and stores |
//! | [`openapi`] | Loading OpenAPI documents |
//! | [`propagation`] | Trace context over HTTP headers (feature `opentelemetry`) |
//!
//! Configuration ([`Config`]), errors ([`Error`]) and the router builder
//! ([`FluentRouter`]) are re-exported at the crate root.
//!
//! # Error Handling
//!
//! The library uses a custom [`Result`] type. Errors convert to structured
//! JSON responses:
//!
//! ```json
//! {
//!   "status": 500,
//!   "error_code": "RESOLUTION_ERROR",
//!   "message": "no handler found for operation (tried api.Pets.search, api.pets.search): no handler registered as 'api.pets.search'",
//!   "details": "attempted: api.Pets.search, api.pets.search"
//! }
//! ```

mod config;
mod error;
mod fluent;
mod utils;

pub mod cache;
pub mod openapi;
pub mod optimizer;
pub mod resolver;

#[cfg(feature = "opentelemetry")]
pub mod propagation;

pub use config::*;
pub use error::*;
pub use fluent::*;
pub use utils::*;

pub use cache::{CacheStore, CachedResponse, ResponseCache};
pub use optimizer::{Content, Optimize, OptimizeContext, ResponseOptimizer};
pub use resolver::{CandidateStrategy, HandlerRegistry, MultipleResourceResolver, RouteDescriptor};

pub type Result<T> = std::result::Result<T, Error>;
