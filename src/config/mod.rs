//!
//! Configuration structures and utilities for wiring up the application or service.
//!
//! A configuration can be created in many ways:
//! - From an environment-specific TOML file via `Config::from_rust_env` or `Config::from_toml_file`
//! - From a TOML string via `Config::from_toml` or `str::parse`
//! - Constructed programmatically via the builder methods on `Config`
//!
//! In the TOML-based methods, environment variables can be referenced using the
//! `{{ VAR_NAME }}` syntax and are substituted before parsing, which keeps
//! secrets such as a Redis URL out of the files.
//!
//! Configuration is split into logical sections:
//!
//! - `HttpConfig` for HTTP server settings, CORS and the response optimizer
//! - `ApiConfig` for OpenAPI documents and operation resolution
//! - `LoggingConfig` for logging and tracing settings
//!
mod api;
mod http;
mod logging;

pub use api::*;
pub use http::*;
pub use logging::*;

#[cfg(feature = "opentelemetry")]
mod opentelemetry;
#[cfg(feature = "opentelemetry")]
pub use opentelemetry::*;

pub use byte_unit::Byte;

use {
    crate::{Error, Result, utils::replace_handlebars_with_env},
    serde::Deserialize,
    std::{env, fs, str::FromStr, time::Duration},
};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    ///
    /// Creates a default configuration.
    /// This will attempt to load configuration from the file based on the RUST_ENV
    /// environment variable falling back to a default configuration if the environment
    /// variable is not set. Configuration files should be located in the "config/"
    /// directory of your project.
    ///
    fn default() -> Self {
        match Self::from_rust_env() {
            Ok(config) => config,
            Err(_) => Config {
                http: HttpConfig::default(),
                api: ApiConfig::default(),
                logging: LoggingConfig::default(),
            },
        }
    }
}

impl Config {
    ///
    /// Loads the configuration from a file based on the RUST_ENV environment variable.
    ///
    pub fn from_rust_env() -> Result<Config> {
        Self::from_toml_file(env::var("RUST_ENV")?)
    }

    ///
    /// Given an environment name, loads "config/{env}.toml", substitutes any
    /// environment variables, and parses it.
    ///
    pub fn from_toml_file(env: impl AsRef<str>) -> Result<Config> {
        let path = format!("config/{}.toml", env.as_ref());
        let text = fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    ///
    /// Parses a configuration string in TOML format into a Config struct.
    ///
    pub fn from_toml(toml_str: &str) -> Result<Config> {
        toml_str.parse()
    }

    /// Sets the HTTP server bind address of the HttpConfig.
    pub fn with_bind_addr<S: AsRef<str>>(mut self, addr: S) -> Self {
        self.http.bind_addr = addr.as_ref().into();
        self
    }

    /// Sets the HTTP server bind port of the HttpConfig.
    pub fn with_bind_port(mut self, port: u16) -> Self {
        self.http.bind_port = port;
        self
    }

    /// Sets the request timeout duration of the HttpConfig.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.http.request_timeout = Some(timeout);
        self
    }

    /// Enables or disables the Prometheus endpoint.
    pub fn with_metrics(mut self, enable: bool) -> Self {
        self.http.with_metrics = enable;
        self
    }

    /// Sets the metrics route path of the HttpConfig.
    pub fn with_metrics_route(mut self, route: &str) -> Self {
        self.http.metrics_route = route.into();
        self
    }

    /// Sets the CORS configuration of the HttpConfig.
    pub fn with_cors_config(mut self, cors_config: HttpCorsConfig) -> Self {
        self.http.cors = Some(cors_config);
        self
    }

    /// Enables the response optimizer with the given configuration.
    pub fn with_optimizer_config(mut self, optimizer: HttpOptimizerConfig) -> Self {
        self.http.optimizer = Some(optimizer);
        self
    }

    /// Sets the OpenAPI configuration.
    pub fn with_api_config(mut self, api: ApiConfig) -> Self {
        self.api = api;
        self
    }

    /// Activates only the specified middlewares.
    pub fn with_included_middlewares(mut self, middlewares: Vec<HttpMiddleware>) -> Self {
        self.http.middleware = Some(HttpMiddlewareConfig::Include(middlewares));
        self
    }

    /// Activates all middlewares except the specified ones.
    pub fn with_excluded_middlewares(mut self, middlewares: Vec<HttpMiddleware>) -> Self {
        self.http.middleware = Some(HttpMiddlewareConfig::Exclude(middlewares));
        self
    }

    /// Sets the log format of the LoggingConfig.
    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.logging.format = format;
        self
    }

    /// Sets the fallback log filter of the LoggingConfig.
    pub fn with_log_level(mut self, level: &str) -> Self {
        self.logging.level = Some(level.into());
        self
    }

    /// Sets the OpenTelemetry configuration of the LoggingConfig.
    #[cfg(feature = "opentelemetry")]
    pub fn with_opentelemetry_config(mut self, otel_config: OpenTelemetryConfig) -> Self {
        self.logging.opentelemetry = Some(otel_config);
        self
    }

    /// Ensures that the configuration is valid.
    pub fn validate(&self) -> Result<()> {
        self.http.validate()?;
        self.api.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    ///
    /// Sets up the tracing subscriber for logging based on the LoggingConfig.
    ///
    /// NOTE: This should be called early during startup to ensure logging is configured
    ///       before any log messages are emitted. With the `opentelemetry` feature,
    ///       `FluentRouter::setup_opentelemetry` installs the exporting layer instead.
    ///
    pub fn setup_tracing(&self) {
        use tracing_subscriber::prelude::*;
        let _ = tracing_subscriber::registry()
            .with(self.logging.fmt_layer())
            .with(self.logging.env_filter())
            .try_init();
    }
}

///
/// Parses a configuration string with references to environment variables
/// into a Config struct by substituting the environment variables and then
/// parsing the resulting TOML.
///
impl FromStr for Config {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        let config_file = replace_handlebars_with_env(s);
        let config = toml::from_str::<Config>(&config_file)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_str_valid() {
        unsafe {
            env::set_var("CONFIG_TEST_REDIS_URL", "redis://cache:6379");
        }

        let config_str = r#"
[http]
bind_addr = "0.0.0.0"
bind_port = 8080

[http.optimizer.cache]
redis_url = "{{ CONFIG_TEST_REDIS_URL }}"

[api]
spec = "openapi/petstore.yaml"

[logging]
format = "json"
        "#;

        let config = config_str.parse::<Config>().unwrap();
        assert_eq!(config.http.bind_addr, "0.0.0.0");
        assert_eq!(config.http.bind_port, 8080);
        assert_eq!(
            config.http.optimizer.unwrap().cache.redis_url(),
            Some("redis://cache:6379")
        );
        assert_eq!(config.api.spec_locations(), vec!["openapi/petstore.yaml"]);
        assert_eq!(config.logging.format, LogFormat::Json);

        unsafe {
            env::remove_var("CONFIG_TEST_REDIS_URL");
        }
    }

    #[test]
    fn test_config_from_str_invalid_toml() {
        let result = "this is not valid toml".parse::<Config>();
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), crate::ErrorKind::Configuration);
    }

    #[test]
    fn test_config_from_missing_file() {
        let result = Config::from_toml_file("does-not-exist");
        assert_eq!(result.unwrap_err().kind(), crate::ErrorKind::Io);
    }

    #[test]
    fn test_config_builder_matches_toml_equivalent() {
        let builder_config = Config::default()
            .with_bind_addr("0.0.0.0")
            .with_bind_port(8080)
            .with_request_timeout(Duration::from_secs(30))
            .with_metrics_route("/prometheus")
            .with_optimizer_config(
                HttpOptimizerConfig::default()
                    .with_minify(false)
                    .with_default_cache_timeout(Duration::from_secs(60)),
            )
            .with_api_config(ApiConfig::default().with_default_module_name("petstore"))
            .with_log_format(LogFormat::Compact)
            .with_log_level("debug");

        let toml_config: Config = r#"
[http]
bind_addr = "0.0.0.0"
bind_port = 8080
request_timeout = "30s"
metrics_route = "/prometheus"

[http.optimizer]
minify = false
default_cache_timeout = "1m"

[api]
default_module_name = "petstore"

[logging]
format = "compact"
level = "debug"
        "#
        .parse()
        .unwrap();

        assert_eq!(builder_config.http.bind_addr, toml_config.http.bind_addr);
        assert_eq!(builder_config.http.bind_port, toml_config.http.bind_port);
        assert_eq!(
            builder_config.http.request_timeout,
            toml_config.http.request_timeout
        );
        assert_eq!(
            builder_config.http.metrics_route,
            toml_config.http.metrics_route
        );

        let built = builder_config.http.optimizer.clone().unwrap();
        let parsed = toml_config.http.optimizer.unwrap();
        assert_eq!(built.minify, parsed.minify);
        assert_eq!(built.compress, parsed.compress);
        assert_eq!(built.default_cache_timeout, parsed.default_cache_timeout);

        assert_eq!(
            builder_config.api.default_module_name,
            toml_config.api.default_module_name
        );
        assert_eq!(builder_config.logging.format, toml_config.logging.format);
        assert_eq!(builder_config.logging.level, toml_config.logging.level);
        assert!(builder_config.validate().is_ok());
    }

    #[test]
    fn test_validate_reports_api_errors() {
        let config = Config::default().with_api_config(ApiConfig::default().with_base_path("v1"));
        assert!(config.validate().is_err());
    }
}
