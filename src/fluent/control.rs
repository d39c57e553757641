//! Failure handling middleware: panic catching and the JSON fallback.

use super::router::FluentRouter;
use crate::{ErrorResponse, HttpMiddleware};

use {
    axum::{
        Json,
        response::{IntoResponse, Response},
    },
    http::{StatusCode, Uri},
    tower_http::catch_panic::CatchPanicLayer,
};

impl<State> FluentRouter<State>
where
    State: Clone + Send + Sync + 'static,
{
    /// Sets up panic catching middleware.
    ///
    /// Catches panics in request handlers and answers with a JSON
    /// `500 Internal Server Error` body instead of dropping the connection.
    /// The panic message is sent to the notification channel configured with
    /// `with_panic_notification_channel()`, if any.
    ///
    /// This middleware is automatically included in `setup_middleware()` as the
    /// outermost layer to ensure ALL panics are caught.
    #[must_use]
    pub fn setup_catch_panic(mut self) -> Self {
        if !self.is_middleware_enabled(HttpMiddleware::CatchPanic) {
            return self;
        }

        let panic_channel = self.panic_channel.clone();
        self.inner = self.inner.layer(CatchPanicLayer::custom(
            move |err: Box<dyn std::any::Any + Send + 'static>| -> Response {
                let msg = if let Some(s) = err.downcast_ref::<String>() {
                    s.clone()
                } else if let Some(s) = err.downcast_ref::<&str>() {
                    s.to_string()
                } else {
                    "unknown panic payload".to_string()
                };

                tracing::error!("Service panicked: {}", msg);
                if let Some(ch) = &panic_channel {
                    ch.try_send(msg).ok();
                }

                let body = ErrorResponse::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal Server Error",
                );
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            },
        ));
        self
    }

    /// Answers unmatched routes with a JSON `404 Not Found` body.
    #[must_use]
    pub fn setup_fallback(mut self) -> Self {
        if !self.is_middleware_enabled(HttpMiddleware::Fallback) {
            return self;
        }

        self.inner = self.inner.fallback(|uri: Uri| async move {
            tracing::debug!(%uri, "No route matched");
            let body = ErrorResponse::new(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("No route for {}", uri.path()),
            );
            (StatusCode::NOT_FOUND, Json(body))
        });
        self
    }
}
