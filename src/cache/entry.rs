use {
    crate::{Error, Result},
    axum::{
        body::{Body, Bytes},
        response::Response,
    },
    base64::{Engine, engine::general_purpose::STANDARD},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
    http_body_util::BodyExt,
    serde::{Deserialize, Serialize},
    std::time::{Duration, SystemTime},
};

/// Owned snapshot of an HTTP response.
///
/// This is the value the optimizer transforms and caches. Header names are
/// stored lower-cased. Header values that are not valid UTF-8 are kept apart,
/// base64 encoded, and replayed untouched by [`CachedResponse::into_response`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
    status: u16,
    headers: Vec<(String, String)>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    opaque_headers: Vec<(String, String)>,
    #[serde(with = "base64_body")]
    body: Bytes,
}

impl CachedResponse {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status: status.as_u16(),
            headers: Vec::new(),
            opaque_headers: Vec::new(),
            body: body.into(),
        }
    }

    /// A `text/html` response.
    pub fn html(body: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, body.into())
            .with_header(header::CONTENT_TYPE.as_str(), "text/html; charset=utf-8")
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.set_header(name, value);
        self
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status.as_u16();
    }

    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// First value of the header `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Replaces every value of `name` with `value`.
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.remove_header(name);
        self.headers
            .push((name.to_ascii_lowercase(), value.to_string()));
    }

    pub fn remove_header(&mut self, name: &str) {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.opaque_headers
            .retain(|(n, _)| !n.eq_ignore_ascii_case(name));
    }

    /// Adds `token` to a comma separated header such as `Vary` unless it is
    /// already listed.
    pub fn merge_header_token(&mut self, name: &str, token: &str) {
        match self.header(name) {
            Some(existing)
                if existing
                    .split(',')
                    .any(|t| t.trim().eq_ignore_ascii_case(token) || t.trim() == "*") => {}
            Some(existing) => {
                let merged = format!("{existing}, {token}");
                self.set_header(name, &merged);
            }
            None => self.set_header(name, token),
        }
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Replaces the body. Any `Content-Length` is dropped since it no longer
    /// describes the payload.
    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = body.into();
        self.remove_header(header::CONTENT_LENGTH.as_str());
    }

    /// The media type without parameters, lower-cased (`text/html`).
    pub fn mimetype(&self) -> Option<String> {
        self.header(header::CONTENT_TYPE.as_str()).map(|ct| {
            ct.split(';')
                .next()
                .unwrap_or(ct)
                .trim()
                .to_ascii_lowercase()
        })
    }

    /// True for `text/html` and `application/xhtml+xml` style media types.
    pub fn is_html(&self) -> bool {
        self.header(header::CONTENT_TYPE.as_str())
            .is_some_and(is_html_content_type)
    }

    /// Buffers a response. Fails when the body cannot be read.
    pub async fn from_response(response: Response) -> Result<Self> {
        let (parts, body) = response.into_parts();
        let body = body
            .collect()
            .await
            .map_err(|e| Error::unsupported_content(format!("failed to read response body: {e}")))?
            .to_bytes();
        Ok(Self::from_parts(parts.status, &parts.headers, body))
    }

    pub fn from_parts(status: StatusCode, headers: &HeaderMap, body: impl Into<Bytes>) -> Self {
        let mut text = Vec::new();
        let mut opaque = Vec::new();
        for (name, value) in headers {
            match value.to_str() {
                Ok(value) => text.push((name.as_str().to_string(), value.to_string())),
                Err(_) => opaque.push((name.as_str().to_string(), STANDARD.encode(value.as_bytes()))),
            }
        }
        Self {
            status: status.as_u16(),
            headers: text,
            opaque_headers: opaque,
            body: body.into(),
        }
    }

    pub fn into_response(self) -> Response {
        let status = self.status();
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = status;
        let headers = response.headers_mut();
        for (name, value) in &self.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.append(name, value);
                }
                _ => tracing::debug!(header = %name, "Skipping invalid cached header"),
            }
        }
        for (name, encoded) in &self.opaque_headers {
            let value = STANDARD
                .decode(encoded)
                .ok()
                .and_then(|bytes| HeaderValue::from_bytes(&bytes).ok());
            match (HeaderName::from_bytes(name.as_bytes()), value) {
                (Ok(name), Some(value)) => {
                    headers.append(name, value);
                }
                _ => tracing::debug!(header = %name, "Skipping invalid cached header"),
            }
        }
        response
    }
}

/// True when a `Content-Type` value names an HTML media type.
pub fn is_html_content_type(content_type: &str) -> bool {
    let mimetype = content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_ascii_lowercase();
    mimetype.ends_with("html") || mimetype.ends_with("html+xml")
}

/// A cached value with its expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub value: CachedResponse,
    pub expires_at: SystemTime,
}

impl CacheEntry {
    pub fn new(value: CachedResponse, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: SystemTime::now() + ttl,
        }
    }

    /// An entry is served only while `now < expires_at`.
    pub fn is_fresh(&self, now: SystemTime) -> bool {
        now < self.expires_at
    }
}

mod base64_body {
    use {
        axum::body::Bytes,
        base64::{Engine, engine::general_purpose::STANDARD},
        serde::{Deserialize, Deserializer, Serializer},
    };

    pub fn serialize<S: Serializer>(body: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(body))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded)
            .map(Bytes::from)
            .map_err(serde::de::Error::custom)
    }
}
