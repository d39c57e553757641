use {
    crate::{Error, Result},
    serde::Deserialize,
};

///
/// OTLP export of request spans.
///
/// ```toml
/// [logging.opentelemetry]
/// endpoint = "http://localhost:4317"
/// service_name = "petstore"
/// sample_ratio = 0.25
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct OpenTelemetryConfig {
    /// OTLP gRPC endpoint of the collector.
    pub endpoint: String,

    /// Service name attached to every span. Defaults to the package name.
    #[serde(default)]
    pub service_name: Option<String>,

    /// Fraction of root traces to sample; parents decide for children.
    /// Defaults to sampling everything.
    #[serde(default)]
    pub sample_ratio: Option<f64>,
}

impl OpenTelemetryConfig {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            service_name: Some(env!("CARGO_PKG_NAME").into()),
            sample_ratio: None,
        }
    }

    pub fn with_service_name(mut self, name: &str) -> Self {
        self.service_name = Some(name.to_string());
        self
    }

    pub fn with_sample_ratio(mut self, ratio: f64) -> Self {
        self.sample_ratio = Some(ratio);
        self
    }

    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.endpoint)?;
        if let Some(ratio) = self.sample_ratio
            && !(0.0..=1.0).contains(&ratio)
        {
            return Err(Error::invalid_input(format!(
                "[logging.opentelemetry] sample_ratio must be within 0.0..=1.0, got {ratio}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(OpenTelemetryConfig::new("http://localhost:4317").validate().is_ok());
        assert!(OpenTelemetryConfig::new("not a url").validate().is_err());
        assert!(
            OpenTelemetryConfig::new("http://localhost:4317")
                .with_sample_ratio(1.5)
                .validate()
                .is_err()
        );
    }
}
