use {
    crate::{Error, Result},
    http::StatusCode,
    serde::Deserialize,
};

///
/// Configuration of the OpenAPI surface.
///
/// ```toml
/// [api]
/// spec = "openapi/petstore.yaml;{{ SHARED_SPEC_URL }}"
/// default_module_name = "api"
/// collection_endpoint_name = "search"
/// base_path = "/v1"
/// resolver_error = 501
/// ```
///
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// OpenAPI document locations, separated by `;`. Each entry is either a
    /// file path or (with the `remote-specs` feature) an http(s) URL.
    #[serde(default)]
    pub spec: Option<String>,

    /// Prefix of every derived handler identifier. Defaults to "api".
    #[serde(default = "ApiConfig::default_module_name")]
    pub default_module_name: String,

    /// Function name used for GET requests on collections. Defaults to "search".
    #[serde(default = "ApiConfig::default_collection_endpoint_name")]
    pub collection_endpoint_name: String,

    /// Path the API is mounted under. When absent the path of the document's
    /// first `servers` entry (or its `basePath`) is used.
    #[serde(default)]
    pub base_path: Option<String>,

    /// When set, operations without a registered handler answer with this
    /// status instead of failing startup.
    #[serde(default)]
    pub resolver_error: Option<u16>,
}

impl ApiConfig {
    fn default_module_name() -> String {
        "api".into()
    }

    fn default_collection_endpoint_name() -> String {
        "search".into()
    }

    /// Splits `spec` into its non-empty locations.
    pub fn spec_locations(&self) -> Vec<&str> {
        self.spec
            .as_deref()
            .map(|specs| crate::openapi::split_locations(specs).collect())
            .unwrap_or_default()
    }

    /// The `resolver_error` setting as a status code.
    pub fn resolver_error_status(&self) -> Option<StatusCode> {
        self.resolver_error
            .and_then(|code| StatusCode::from_u16(code).ok())
    }

    pub fn with_spec(mut self, spec: impl Into<String>) -> Self {
        self.spec = Some(spec.into());
        self
    }

    pub fn with_default_module_name(mut self, name: impl Into<String>) -> Self {
        self.default_module_name = name.into();
        self
    }

    pub fn with_collection_endpoint_name(mut self, name: impl Into<String>) -> Self {
        self.collection_endpoint_name = name.into();
        self
    }

    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = Some(base_path.into());
        self
    }

    pub fn with_resolver_error(mut self, status: StatusCode) -> Self {
        self.resolver_error = Some(status.as_u16());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_module_name.trim().is_empty() {
            return Err(Error::invalid_input(
                "[api] default_module_name must not be empty",
            ));
        }

        if self.collection_endpoint_name.trim().is_empty() {
            return Err(Error::invalid_input(
                "[api] collection_endpoint_name must not be empty",
            ));
        }

        if let Some(base_path) = &self.base_path
            && !base_path.starts_with('/')
        {
            return Err(Error::invalid_input(format!(
                "[api] base_path must start with '/', got {base_path:?}"
            )));
        }

        if let Some(code) = self.resolver_error
            && StatusCode::from_u16(code).is_err()
        {
            return Err(Error::invalid_input(format!(
                "[api] resolver_error must be a valid HTTP status code, got {code}"
            )));
        }

        Ok(())
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            spec: None,
            default_module_name: Self::default_module_name(),
            collection_endpoint_name: Self::default_collection_endpoint_name(),
            base_path: None,
            resolver_error: None,
        }
    }
}
