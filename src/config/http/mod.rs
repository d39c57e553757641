mod cors;
mod middleware;
mod optimizer;

pub use cors::*;
pub use middleware::*;
pub use optimizer::*;

use {crate::Result, serde::Deserialize, std::time::Duration};

///
/// Configuration for the HTTP server
///
/// Binding, timeouts, the metrics route and the optional middleware sections
/// (`[http.cors]`, `[http.optimizer]`).
///
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// IP address to bind the HTTP server to
    /// The default `bind_addr` is "127.0.0.1".
    #[serde(default = "HttpConfig::default_bind_addr")]
    pub bind_addr: String,

    /// Port to bind the HTTP server to
    /// The default `bind_port` is 3000.
    #[serde(default = "HttpConfig::default_bind_port")]
    pub bind_port: u16,

    /// Maximum allowed time for a request to complete before timing out
    /// with a 408 Request Timeout. By default `request_timeout` is None.
    #[serde(default, with = "humantime_serde")]
    pub request_timeout: Option<Duration>,

    /// Whether or not to expose the Prometheus metrics endpoint.
    /// By default `with_metrics` is set to true.
    #[serde(default = "HttpConfig::default_with_metrics")]
    pub with_metrics: bool,

    /// Route for metrics. Requests to this route are never traced.
    /// By default `metrics_route` is set to "/metrics".
    #[serde(default = "HttpConfig::default_metrics_route")]
    pub metrics_route: String,

    /// CORS configuration. If not present defaults depend on RUST_ENV.
    #[serde(default)]
    pub cors: Option<HttpCorsConfig>,

    /// Response optimizer configuration. If not present the optimizer is
    /// not installed.
    #[serde(default)]
    pub optimizer: Option<HttpOptimizerConfig>,

    /// Maximum time to wait for in-flight requests once a shutdown signal
    /// has been received. By default `shutdown_timeout` is 30 seconds.
    #[serde(
        default = "HttpConfig::default_shutdown_timeout",
        with = "humantime_serde"
    )]
    pub shutdown_timeout: Duration,

    #[serde(flatten)]
    pub middleware: Option<HttpMiddlewareConfig>,
}

impl HttpConfig {
    ///
    /// Returns the full bind address as a string in the format "IP:PORT".
    ///
    pub fn full_bind_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.bind_port)
    }

    fn default_bind_addr() -> String {
        "127.0.0.1".into()
    }

    fn default_bind_port() -> u16 {
        3000
    }

    fn default_with_metrics() -> bool {
        true
    }

    fn default_metrics_route() -> String {
        "/metrics".into()
    }

    fn default_shutdown_timeout() -> Duration {
        Duration::from_secs(30)
    }

    pub fn validate(&self) -> Result<()> {
        if self.bind_addr.trim().is_empty() {
            return Err(crate::Error::invalid_input(
                "HTTP bind_addr is required. Set [http] bind_addr = \"0.0.0.0\" or \"127.0.0.1\" in config.",
            ));
        }

        if self.bind_addr.parse::<std::net::IpAddr>().is_err() {
            return Err(crate::Error::invalid_input(
                "HTTP bind_addr must be a valid IP address. Examples: \"127.0.0.1\", \"0.0.0.0\", \"::1\"",
            ));
        }

        if !self.metrics_route.starts_with('/') {
            return Err(crate::Error::invalid_input(
                "HTTP metrics_route must start with '/'",
            ));
        }

        if let Some(cors) = &self.cors {
            cors.validate()?;
        }

        if let Some(optimizer) = &self.optimizer {
            optimizer.validate()?;
        }

        if let Some(middleware_config) = &self.middleware {
            middleware_config.validate()?;
        }

        Ok(())
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            bind_addr: Self::default_bind_addr(),
            bind_port: Self::default_bind_port(),
            request_timeout: None,
            with_metrics: Self::default_with_metrics(),
            metrics_route: Self::default_metrics_route(),
            cors: None,
            optimizer: None,
            shutdown_timeout: Self::default_shutdown_timeout(),
            middleware: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;

    #[test]
    fn test_http_defaults() {
        let http = HttpConfig::default();
        assert_eq!(http.full_bind_addr(), "127.0.0.1:3000");
        assert!(http.with_metrics);
        assert_eq!(http.metrics_route, "/metrics");
        assert_eq!(http.shutdown_timeout, Duration::from_secs(30));
        assert!(http.validate().is_ok());
    }

    #[test]
    fn test_http_from_toml() {
        let config: Config = r#"
[http]
bind_addr = "0.0.0.0"
bind_port = 8080
request_timeout = "5s"
with_metrics = false
metrics_route = "/prometheus"
shutdown_timeout = "10s"
        "#
        .parse()
        .unwrap();

        assert_eq!(config.http.full_bind_addr(), "0.0.0.0:8080");
        assert_eq!(config.http.request_timeout, Some(Duration::from_secs(5)));
        assert!(!config.http.with_metrics);
        assert_eq!(config.http.metrics_route, "/prometheus");
        assert_eq!(config.http.shutdown_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_validate_rejects_bad_bind_addr() {
        let mut http = HttpConfig::default();
        http.bind_addr = "localhost".into();
        assert!(http.validate().is_err());

        http.bind_addr = " ".into();
        assert!(http.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_relative_metrics_route() {
        let mut http = HttpConfig::default();
        http.metrics_route = "metrics".into();
        assert!(http.validate().is_err());
    }

    #[test]
    fn test_validate_checks_optimizer() {
        let mut http = HttpConfig::default();
        http.optimizer = Some(HttpOptimizerConfig::default().with_max_buffer_size(0));
        assert!(http.validate().is_err());
    }
}
