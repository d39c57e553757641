use {
    crate::{Error, Result, cache::CachedResponse},
    axum::{
        body::Bytes,
        response::{IntoResponse, Response},
    },
    http::StatusCode,
};

/// A value the optimizer stages can transform.
///
/// Bare bodies (`Text`, `Bytes`) carry no content type and are treated as
/// HTML markup. `WithStatus` pairs a body with a status code; stages only
/// transform the body and keep the status. A pair nested in another pair is
/// rejected with an `UnsupportedContent` error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Bytes(Bytes),
    Response(CachedResponse),
    WithStatus(Box<Content>, StatusCode),
}

impl Content {
    #[must_use]
    pub fn with_status(self, status: StatusCode) -> Self {
        Content::WithStatus(Box::new(self), status)
    }

    /// Converts the content into a full response snapshot.
    pub fn into_cached(self) -> Result<CachedResponse> {
        match self {
            Content::Text(text) => Ok(CachedResponse::html(text)),
            Content::Bytes(bytes) => Ok(CachedResponse::new(StatusCode::OK, bytes).with_header(
                http::header::CONTENT_TYPE.as_str(),
                "text/html; charset=utf-8",
            )),
            Content::Response(response) => Ok(response),
            Content::WithStatus(inner, status) => {
                let mut response = inner.into_unnested()?.into_cached()?;
                response.set_status(status);
                Ok(response)
            }
        }
    }

    /// The inner content of a `WithStatus` pair, rejecting nested pairs.
    pub(crate) fn into_unnested(self) -> Result<Content> {
        match self {
            Content::WithStatus(_, status) => Err(Error::unsupported_content(format!(
                "a (content, {status}) pair cannot contain another pair"
            ))),
            content => Ok(content),
        }
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Content::Text(text)
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Content::Text(text.to_string())
    }
}

impl From<Bytes> for Content {
    fn from(bytes: Bytes) -> Self {
        Content::Bytes(bytes)
    }
}

impl From<Vec<u8>> for Content {
    fn from(bytes: Vec<u8>) -> Self {
        Content::Bytes(bytes.into())
    }
}

impl From<CachedResponse> for Content {
    fn from(response: CachedResponse) -> Self {
        Content::Response(response)
    }
}

impl<T: Into<Content>> From<(T, StatusCode)> for Content {
    fn from((content, status): (T, StatusCode)) -> Self {
        content.into().with_status(status)
    }
}

impl IntoResponse for Content {
    fn into_response(self) -> Response {
        match self.into_cached() {
            Ok(response) => response.into_response(),
            Err(error) => error.into_response(),
        }
    }
}
