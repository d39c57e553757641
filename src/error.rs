//! Error types and handling for the library.
//!
//! This module provides structured error responses with stable error codes and
//! automatic HTTP status code mapping. All errors implement `IntoResponse` and
//! serialize to JSON, which is also the shape used for unmatched routes and
//! caught panics.
//!
//! # Design
//!
//! `Error` is opaque and paired with an `ErrorKind` enum, following the
//! `std::io::Error` pattern. Resolution failures keep their structured detail
//! (the identifiers that were attempted) in a [`ResolutionError`] that can be
//! recovered with [`Error::resolution_details`].
//!
//! # Example
//!
//! ```rust
//! use axum_openapi_plus::{Error, ErrorKind};
//! use axum::http::StatusCode;
//!
//! let error = Error::unsupported_content("nested (content, status) pair");
//! assert_eq!(error.kind(), ErrorKind::UnsupportedContent);
//! assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// The kind of error that occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Configuration error (invalid TOML, missing values).
    #[error("configuration error")]
    Configuration,

    /// I/O error (file operations, network).
    #[error("I/O error")]
    Io,

    /// Invalid input (bad URL, header, OpenAPI document).
    #[error("invalid input")]
    InvalidInput,

    /// No route matched the request.
    #[error("not found")]
    NotFound,

    /// No handler could be found for an operation.
    #[error("resolution error")]
    Resolution,

    /// A response optimization stage received content it cannot transform.
    #[error("unsupported content")]
    UnsupportedContent,

    /// The cache backend failed (connection, serialization).
    #[error("cache backend error")]
    CacheBackend,

    /// Internal/unexpected error.
    #[error("internal error")]
    Internal,
}

/// An error that can occur in the library.
///
/// Use [`Error::kind()`] to determine the category of error for matching,
/// and the `Display` implementation to get a human-readable message.
///
/// ```rust
/// use axum_openapi_plus::{Error, ErrorKind};
///
/// let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "openapi.yaml");
/// let err = Error::new(ErrorKind::Io, io_err);
/// assert_eq!(err.kind(), ErrorKind::Io);
/// ```
pub struct Error {
    kind: ErrorKind,
    source: Box<dyn std::error::Error + Send + Sync + 'static>,
}

impl Error {
    /// Creates a new error with the given kind and source.
    pub fn new<E>(kind: ErrorKind, error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        Self {
            kind,
            source: error.into(),
        }
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error code string for this error.
    ///
    /// This is a stable identifier suitable for client-side error handling.
    pub fn error_code(&self) -> &'static str {
        match self.kind {
            ErrorKind::Configuration => "CONFIG_ERROR",
            ErrorKind::Io => "IO_ERROR",
            ErrorKind::InvalidInput => "INVALID_INPUT",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Resolution => "RESOLUTION_ERROR",
            ErrorKind::UnsupportedContent => "UNSUPPORTED_CONTENT",
            ErrorKind::CacheBackend => "CACHE_BACKEND_ERROR",
            ErrorKind::Internal => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self.kind {
            ErrorKind::Configuration => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::Io => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Resolution => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::UnsupportedContent => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::CacheBackend => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converts the error into a structured error response.
    pub fn to_error_response(&self) -> ErrorResponse {
        let response = ErrorResponse::new(self.status_code(), self.error_code(), self.to_string());
        match self.resolution_details() {
            Some(details) if !details.attempted.is_empty() => {
                response.with_details(format!("attempted: {}", details.attempted.join(", ")))
            }
            _ => response,
        }
    }

    /// Returns the structured resolution failure when this is a `Resolution` error.
    pub fn resolution_details(&self) -> Option<&ResolutionError> {
        self.source.downcast_ref::<ResolutionError>()
    }

    /// Consumes the error and returns the inner error source.
    pub fn into_inner(self) -> Box<dyn std::error::Error + Send + Sync + 'static> {
        self.source
    }
}

// ============================================================================
// Convenience constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, msg.into())
    }

    /// Creates an I/O error from a message.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, msg.into())
    }

    /// Creates an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, msg.into())
    }

    /// Creates a not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, msg.into())
    }

    /// Creates a resolution error listing every identifier that was attempted.
    pub fn resolution(attempted: Vec<String>, last: Option<Error>) -> Self {
        Self::new(ErrorKind::Resolution, ResolutionError { attempted, last })
    }

    /// Creates an unsupported content error.
    pub fn unsupported_content(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnsupportedContent, msg.into())
    }

    /// Creates a cache backend error.
    pub fn cache_backend(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::CacheBackend, msg.into())
    }

    /// Creates an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, msg.into())
    }
}

// ============================================================================
// Trait implementations
// ============================================================================

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Error")
            .field("kind", &self.kind)
            .field("source", &self.source)
            .finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.source)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_response = self.to_error_response();

        if status.is_server_error() {
            tracing::error!(
                error_code = %error_response.error_code,
                message = %error_response.message,
                status = %status.as_u16(),
                "Error occurred"
            );
        } else {
            tracing::debug!(
                error_code = %error_response.error_code,
                message = %error_response.message,
                status = %status.as_u16(),
                "Request rejected"
            );
        }

        (status, Json(error_response)).into_response()
    }
}

// ============================================================================
// ResolutionError
// ============================================================================

/// Details of a failed operation resolution.
///
/// Carries every candidate identifier in the order it was tried, plus the
/// last lookup error encountered.
#[derive(Debug)]
pub struct ResolutionError {
    /// Candidate identifiers, in attempt order.
    pub attempted: Vec<String>,
    /// The lookup error returned for the last candidate.
    pub last: Option<Error>,
}

impl fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "no handler found for operation (tried {})",
            self.attempted.join(", ")
        )?;
        if let Some(last) = &self.last {
            write!(f, ": {last}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ResolutionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.last
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ============================================================================
// From implementations
// ============================================================================

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::new(ErrorKind::Io, err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::new(ErrorKind::Configuration, err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::new(ErrorKind::InvalidInput, err)
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Self::new(ErrorKind::InvalidInput, err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::new(ErrorKind::InvalidInput, err)
    }
}

impl From<std::env::VarError> for Error {
    fn from(err: std::env::VarError) -> Self {
        Self::new(ErrorKind::Configuration, err)
    }
}

impl From<http::header::InvalidHeaderValue> for Error {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Self::new(ErrorKind::InvalidInput, err)
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for Error {
    fn from(err: redis::RedisError) -> Self {
        Self::new(ErrorKind::CacheBackend, err)
    }
}

#[cfg(feature = "remote-specs")]
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::new(ErrorKind::Io, err)
    }
}

// ============================================================================
// ErrorResponse
// ============================================================================

/// Structured JSON error body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// HTTP status code of the response.
    pub status: u16,
    /// Unique error code for client-side error handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    /// Creates a new error response.
    pub fn new(
        status: StatusCode,
        error_code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status: status.as_u16(),
            error_code: error_code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Adds details to the error response.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
