//! Middleware-specific tests for FluentRouter
//!
//! Tests are organized by middleware type in separate modules.

#[cfg(feature = "cors")]
mod cors;

mod catch_panic;
mod config;
mod fallback;
mod timeout;
mod tracing;
