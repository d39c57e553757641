use crate::Result;
use serde::Deserialize;

/// Selects which middleware `setup_middleware()` installs.
///
/// ```toml
/// [http]
/// exclude = ["cors", "metrics"]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub enum HttpMiddlewareConfig {
    #[serde(rename = "include")]
    Include(Vec<HttpMiddleware>),
    #[serde(rename = "exclude")]
    Exclude(Vec<HttpMiddleware>),
}

impl HttpMiddlewareConfig {
    pub fn is_enabled(&self, middleware: HttpMiddleware) -> bool {
        match self {
            HttpMiddlewareConfig::Include(list) => list.contains(&middleware),
            HttpMiddlewareConfig::Exclude(list) => !list.contains(&middleware),
        }
    }

    /// Validates the middleware selection.
    ///
    /// Disabling panic recovery is allowed (tests do it) but is almost never
    /// what a deployed service wants, so it is reported.
    pub fn validate(&self) -> Result<()> {
        if !self.is_enabled(HttpMiddleware::CatchPanic) {
            tracing::warn!(
                "catch-panic middleware is disabled; a panicking handler will drop its connection"
            );
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum HttpMiddleware {
    Optimizer,
    Cors,
    Tracing,
    Metrics,
    Timeout,
    CatchPanic,
    Fallback,
}
