//! Loading OpenAPI documents.
//!
//! Documents are read from files or (with the `remote-specs` feature) from
//! http(s) URLs, in YAML or JSON, and reduced to the [`RouteDescriptor`]s the
//! resolver works on. Several documents can be listed in a single string
//! separated by `;`:
//!
//! ```rust,no_run
//! # async fn run() -> axum_openapi_plus::Result<()> {
//! use axum_openapi_plus::openapi::load_specs;
//!
//! let specs = load_specs("openapi/petstore.yaml;openapi/store.json").await?;
//! for spec in &specs {
//!     println!("{}: {} operations", spec.source(), spec.routes().len());
//! }
//! # Ok(())
//! # }
//! ```

use {
    crate::{
        Error, Result,
        resolver::RouteDescriptor,
        utils::{is_file, is_url},
    },
    http::Method,
    serde_json::Value,
    std::{fs, path::Path},
};

const ROUTER_CONTROLLER: &str = "x-openapi-router-controller";

const METHODS: [(&str, Method); 8] = [
    ("get", Method::GET),
    ("put", Method::PUT),
    ("post", Method::POST),
    ("delete", Method::DELETE),
    ("options", Method::OPTIONS),
    ("head", Method::HEAD),
    ("patch", Method::PATCH),
    ("trace", Method::TRACE),
];

/// A parsed OpenAPI (or Swagger 2) document.
#[derive(Debug, Clone)]
pub struct ApiSpec {
    document: Value,
    source: String,
}

impl ApiSpec {
    /// Parses a document. JSON is used when `source` ends in `.json`,
    /// YAML otherwise.
    pub fn parse(text: &str, source: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let document: Value = if source.to_ascii_lowercase().ends_with(".json") {
            serde_json::from_str(text)?
        } else {
            serde_yaml::from_str(text)?
        };
        Self::from_value(document, source)
    }

    /// Wraps an already parsed document.
    pub fn from_value(document: Value, source: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let is_openapi = document
            .as_object()
            .is_some_and(|doc| doc.contains_key("openapi") || doc.contains_key("swagger"));
        if !is_openapi {
            return Err(Error::invalid_input(format!(
                "{source} is not an OpenAPI document (missing 'openapi' or 'swagger' field)"
            )));
        }
        Ok(Self { document, source })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        Self::parse(&text, path.display().to_string())
    }

    #[cfg(feature = "remote-specs")]
    pub async fn from_url(url: &str) -> Result<Self> {
        let text = reqwest::get(url).await?.error_for_status()?.text().await?;
        Self::parse(&text, url)
    }

    /// Loads a document from a URL or a file path.
    pub async fn load(location: &str) -> Result<Self> {
        if is_url(location) {
            #[cfg(feature = "remote-specs")]
            return Self::from_url(location).await;
            #[cfg(not(feature = "remote-specs"))]
            return Err(Error::config(format!(
                "cannot load {location}: loading OpenAPI documents from URLs requires the `remote-specs` feature"
            )));
        }
        if is_file(location) {
            return Self::from_file(location);
        }
        Err(Error::invalid_input(format!(
            "not a valid OpenAPI url or file path: {location}"
        )))
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Where the document was loaded from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn title(&self) -> Option<&str> {
        self.document.pointer("/info/title").and_then(Value::as_str)
    }

    /// Path prefix of the API: the path of the first `servers` entry
    /// (OpenAPI 3) or `basePath` (Swagger 2). A root path yields `None`.
    pub fn base_path(&self) -> Option<String> {
        let from_servers = self
            .document
            .pointer("/servers/0/url")
            .and_then(Value::as_str)
            .and_then(|server| {
                if server.starts_with('/') {
                    Some(server.to_string())
                } else {
                    url::Url::parse(server).ok().map(|url| url.path().to_string())
                }
            });
        let base = from_servers.or_else(|| {
            self.document
                .get("basePath")
                .and_then(Value::as_str)
                .map(str::to_string)
        })?;
        let base = base.trim_end_matches('/');
        (!base.is_empty()).then(|| base.to_string())
    }

    /// Every operation of the document, in path order.
    pub fn routes(&self) -> Vec<RouteDescriptor> {
        let Some(paths) = self.document.get("paths").and_then(Value::as_object) else {
            return Vec::new();
        };
        let mut routes = Vec::new();
        for (path, item) in paths {
            let path_controller = item.get(ROUTER_CONTROLLER).and_then(Value::as_str);
            for (name, method) in &METHODS {
                let Some(operation) = item.get(*name).filter(|op| op.is_object()) else {
                    continue;
                };
                let controller = operation
                    .get(ROUTER_CONTROLLER)
                    .and_then(Value::as_str)
                    .or(path_controller);
                routes.push(RouteDescriptor {
                    path: path.clone(),
                    method: method.clone(),
                    operation_id: operation
                        .get("operationId")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    router_controller: controller.map(str::to_string),
                });
            }
        }
        routes
    }
}

/// Loads every `;` separated location in order.
pub async fn load_specs(locations: &str) -> Result<Vec<ApiSpec>> {
    let mut specs = Vec::new();
    for location in split_locations(locations) {
        let spec = ApiSpec::load(location).await?;
        tracing::info!(source = spec.source(), title = spec.title(), "Loaded OpenAPI document");
        specs.push(spec);
    }
    Ok(specs)
}

/// Splits a `;` separated list of document locations, skipping blanks.
pub fn split_locations(locations: &str) -> impl Iterator<Item = &str> {
    locations
        .split(';')
        .map(str::trim)
        .filter(|location| !location.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    const PETSTORE: &str = r#"
openapi: 3.0.0
info:
  title: Petstore
  version: 1.0.0
servers:
  - url: http://petstore.example.com/v1/
paths:
  /pets:
    get:
      responses: {}
    post:
      operationId: createPet
      x-openapi-router-controller: petstore.admin
      responses: {}
  /pets/{id}:
    x-openapi-router-controller: petstore.animals
    parameters:
      - name: id
        in: path
    get:
      responses: {}
"#;

    #[test]
    fn test_routes() {
        let spec = ApiSpec::parse(PETSTORE, "petstore.yaml").unwrap();
        let routes = spec.routes();
        assert_eq!(routes.len(), 3);

        assert_eq!(routes[0], RouteDescriptor::new(Method::GET, "/pets"));
        assert_eq!(
            routes[1],
            RouteDescriptor::new(Method::POST, "/pets")
                .with_operation_id("createPet")
                .with_router_controller("petstore.admin")
        );
        assert_eq!(
            routes[2],
            RouteDescriptor::new(Method::GET, "/pets/{id}")
                .with_router_controller("petstore.animals")
        );
        assert_eq!(spec.title(), Some("Petstore"));
    }

    #[test]
    fn test_base_path() {
        let spec = ApiSpec::parse(PETSTORE, "petstore.yaml").unwrap();
        assert_eq!(spec.base_path().as_deref(), Some("/v1"));

        let swagger = ApiSpec::parse(
            r#"{"swagger": "2.0", "basePath": "/api/", "paths": {}}"#,
            "swagger.json",
        )
        .unwrap();
        assert_eq!(swagger.base_path().as_deref(), Some("/api"));

        let root = ApiSpec::parse(
            "openapi: 3.1.0\nservers:\n  - url: /\npaths: {}\n",
            "root.yaml",
        )
        .unwrap();
        assert_eq!(root.base_path(), None);
    }

    #[test]
    fn test_rejects_non_openapi_documents() {
        let error = ApiSpec::parse("name: not a spec\n", "other.yaml").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidInput);

        let error = ApiSpec::parse("{ broken", "broken.json").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_load_rejects_unknown_location() {
        let error = ApiSpec::load("./does/not/exist.yaml").await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidInput);

        let error = ApiSpec::load("https:/missing-slash.example.com").await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_load_specs_from_files() {
        let dir = std::env::temp_dir().join(format!("openapi-load-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let yaml = dir.join("petstore.yaml");
        let json = dir.join("store.json");
        fs::write(&yaml, PETSTORE).unwrap();
        fs::write(&json, r#"{"openapi": "3.0.0", "paths": {"/orders": {"get": {}}}}"#).unwrap();

        let locations = format!("{};  ;{}", yaml.display(), json.display());
        let specs = load_specs(&locations).await.unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].routes().len(), 3);
        assert_eq!(specs[1].routes(), vec![RouteDescriptor::new(Method::GET, "/orders")]);

        fs::remove_dir_all(dir).unwrap();
    }
}
