use {
    crate::{Error, Result},
    http::{HeaderName, Method},
    serde::Deserialize,
    std::time::Duration,
};

/// Configuration for Cross-Origin Resource Sharing (CORS).
///
/// All fields are optional. A missing `[http.cors]` section means permissive
/// CORS outside production and same-origin only in production.
///
/// ```toml
/// [http.cors]
/// allowed_origins = ["https://app.example.com"]
/// allowed_methods = ["GET", "POST"]
/// allowed_headers = ["content-type", "traceparent"]
/// max_age = "1h"
/// ```
///
/// Unlisted origins, methods and headers default to "any", except with
/// `allow_credentials = true` where wildcards are never emitted and every
/// list must be explicit.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct HttpCorsConfig {
    pub allow_credentials: Option<bool>,
    pub allowed_origins: Option<Vec<String>>,
    pub allowed_methods: Option<Vec<CorsMethod>>,
    pub allowed_headers: Option<Vec<CorsHeader>>,
    pub exposed_headers: Option<Vec<CorsHeader>>,
    #[serde(default, with = "humantime_serde")]
    pub max_age: Option<Duration>,
}

impl HttpCorsConfig {
    pub fn with_allow_credentials(self) -> Self {
        Self {
            allow_credentials: Some(true),
            ..self
        }
    }

    pub fn with_allowed_origins(self, origins: Vec<String>) -> Self {
        Self {
            allowed_origins: Some(origins),
            ..self
        }
    }

    pub fn with_allowed_methods(self, methods: Vec<CorsMethod>) -> Self {
        Self {
            allowed_methods: Some(methods),
            ..self
        }
    }

    pub fn with_allowed_headers(self, headers: Vec<CorsHeader>) -> Self {
        Self {
            allowed_headers: Some(headers),
            ..self
        }
    }

    pub fn with_exposed_headers(self, headers: Vec<CorsHeader>) -> Self {
        Self {
            exposed_headers: Some(headers),
            ..self
        }
    }

    pub fn with_max_age(self, max_age: Duration) -> Self {
        Self {
            max_age: Some(max_age),
            ..self
        }
    }

    fn credentials(&self) -> bool {
        self.allow_credentials.unwrap_or(false)
    }

    /// Browsers reject `*` together with credentials, so the combination is
    /// refused up front.
    pub fn validate(&self) -> Result<()> {
        let wildcard = self
            .allowed_origins
            .iter()
            .flatten()
            .any(|origin| origin.trim() == "*");
        if self.credentials() && wildcard {
            return Err(Error::invalid_input(
                "[http.cors] allowed_origins cannot contain \"*\" when allow_credentials is true",
            ));
        }
        Ok(())
    }

    /// Builds the tower-http layer for this policy. Invalid origins are
    /// skipped with a warning.
    #[cfg(feature = "cors")]
    pub(crate) fn to_layer(&self) -> tower_http::cors::CorsLayer {
        use {
            http::HeaderValue,
            tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer},
        };

        let credentials = self.credentials();
        let mut cors = CorsLayer::new();

        match &self.allowed_origins {
            Some(origins) if origins.iter().any(|o| o.trim() == "*") => {
                cors = cors.allow_origin(Any);
            }
            Some(origins) => {
                let origins = origins.iter().filter_map(|origin| {
                    HeaderValue::from_str(origin)
                        .inspect_err(|_| tracing::warn!(origin, "Ignoring invalid CORS origin"))
                        .ok()
                });
                cors = cors.allow_origin(AllowOrigin::list(origins));
            }
            None if !credentials => cors = cors.allow_origin(Any),
            None => {}
        }

        match &self.allowed_methods {
            Some(methods) => {
                cors = cors.allow_methods(AllowMethods::list(methods.iter().map(|m| m.0.clone())));
            }
            None if !credentials => cors = cors.allow_methods(Any),
            None => {}
        }

        match &self.allowed_headers {
            Some(headers) => {
                cors = cors.allow_headers(AllowHeaders::list(headers.iter().map(|h| h.0.clone())));
            }
            None if !credentials => cors = cors.allow_headers(Any),
            None => {}
        }

        if let Some(headers) = &self.exposed_headers {
            cors = cors.expose_headers(headers.iter().map(|h| h.0.clone()).collect::<Vec<_>>());
        }
        if let Some(max_age) = self.max_age {
            cors = cors.max_age(max_age);
        }
        if credentials {
            cors = cors.allow_credentials(true);
        }
        cors
    }
}

/// HTTP method parsed from its string form (`"GET"`).
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "String")]
pub struct CorsMethod(pub Method);

impl TryFrom<String> for CorsMethod {
    type Error = http::method::InvalidMethod;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Method::from_bytes(value.to_ascii_uppercase().as_bytes()).map(CorsMethod)
    }
}

/// Header name parsed from its string form (`"content-type"`).
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "String")]
pub struct CorsHeader(pub HeaderName);

impl TryFrom<String> for CorsHeader {
    type Error = http::header::InvalidHeaderName;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        HeaderName::try_from(value).map(CorsHeader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;

    #[test]
    fn test_cors_config_absent() {
        let config: Config = "[http]\nbind_port = 3000\n".parse().unwrap();
        assert!(config.http.cors.is_none());
    }

    #[test]
    fn test_cors_config_full() {
        let config: Config = r#"
[http.cors]
allow_credentials = true
allowed_origins = ["https://app.example.com"]
allowed_methods = ["get", "POST"]
allowed_headers = ["content-type", "traceparent"]
exposed_headers = ["content-encoding"]
max_age = "1h"
        "#
        .parse()
        .unwrap();

        let cors = config.http.cors.unwrap();
        assert_eq!(cors.allow_credentials, Some(true));
        assert_eq!(cors.allowed_origins.unwrap(), vec!["https://app.example.com"]);
        let methods = cors.allowed_methods.unwrap();
        assert_eq!(methods[0].0, Method::GET);
        assert_eq!(methods[1].0, Method::POST);
        assert_eq!(cors.allowed_headers.unwrap()[1].0.as_str(), "traceparent");
        assert_eq!(cors.max_age, Some(Duration::from_secs(3600)));
    }

    #[test]
    fn test_cors_invalid_method_rejected() {
        let result = r#"
[http.cors]
allowed_methods = ["NOT A METHOD"]
        "#
        .parse::<Config>();
        assert!(result.is_err());
    }

    #[test]
    fn test_cors_credentials_with_wildcard_rejected() {
        let cors = HttpCorsConfig::default()
            .with_allowed_origins(vec!["*".into()])
            .with_allow_credentials();
        assert!(cors.validate().is_err());

        let cors = HttpCorsConfig::default().with_allowed_origins(vec!["*".into()]);
        assert!(cors.validate().is_ok());
    }
}
