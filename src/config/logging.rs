use {
    crate::{Error, Result},
    serde::Deserialize,
    tracing::Subscriber,
    tracing_subscriber::{EnvFilter, Layer, fmt, registry::LookupSpan},
};

#[cfg(feature = "opentelemetry")]
use crate::config::opentelemetry::OpenTelemetryConfig;

///
/// Configuration for logging and tracing.
///
#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    /// Format for log output.
    /// The default format is `default`, which is "full" human-readable format.
    /// Other options are `json`, `compact`, and `pretty`.
    #[serde(default)]
    pub format: LogFormat,

    /// Filter directives used when `RUST_LOG` is not set, e.g. `"info"` or
    /// `"axum_openapi_plus=debug,info"`.
    #[serde(default)]
    pub level: Option<String>,

    /// OpenTelemetry configuration (optional).
    /// When configured, enables distributed tracing with OTLP export.
    #[cfg(feature = "opentelemetry")]
    #[serde(default)]
    pub opentelemetry: Option<OpenTelemetryConfig>,
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<()> {
        if let Some(level) = &self.level {
            EnvFilter::try_new(level).map_err(|e| {
                Error::invalid_input(format!("[logging] level {level:?} is invalid: {e}"))
            })?;
        }
        #[cfg(feature = "opentelemetry")]
        if let Some(otel) = &self.opentelemetry {
            otel.validate()?;
        }
        Ok(())
    }

    /// Builds the filter: `RUST_LOG` wins, then `level`, then `info`.
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            self.level
                .as_deref()
                .and_then(|level| EnvFilter::try_new(level).ok())
                .unwrap_or_else(|| EnvFilter::new("info"))
        })
    }

    /// The `fmt` layer for the configured format.
    pub fn fmt_layer<S>(&self) -> Box<dyn Layer<S> + Send + Sync + 'static>
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
    {
        match self.format {
            LogFormat::Json => fmt::layer().json().boxed(),
            LogFormat::Default => fmt::layer().boxed(),
            LogFormat::Compact => fmt::layer().compact().boxed(),
            LogFormat::Pretty => fmt::layer().pretty().boxed(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Default,
    Compact,
    Pretty,
}
