//! FluentRouter and middleware configuration.
//!
//! The functionality is split across submodules:
//!
//! - [`router`] - Core `FluentRouter` struct and initialization
//! - [`api`] - Mounting OpenAPI operations
//! - [`observability`] - Tracing, metrics, OpenTelemetry
//! - [`features`] - Response optimizer, CORS, timeout
//! - [`control`] - Panic catching and the JSON fallback
//! - [`builder`] - Orchestration (setup_middleware, start, router delegation)

mod api;
mod builder;
mod control;
mod features;
mod observability;
mod router;

pub use router::FluentRouter;

#[cfg(test)]
mod tests;
