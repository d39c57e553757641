//!
//! REST operation resolution for nested resources.
//!
//! [`MultipleResourceResolver`] derives a handler identifier such as
//! `api.Pets.Toys.search` from an OpenAPI path template and an HTTP method.
//! Resource segments become a dotted module path, the method becomes the
//! function name, and a GET that addresses more resources than it consumes
//! parameters is routed to the collection endpoint:
//!
//! | Method | Path                         | Identifier              |
//! |--------|------------------------------|-------------------------|
//! | GET    | `/pets`                      | `api.Pets.search`       |
//! | GET    | `/pets/{id}`                 | `api.Pets.get`          |
//! | GET    | `/pets/{id}/toys`            | `api.Pets.Toys.search`  |
//! | DELETE | `/pets/{id}/toys/{toy_id}`   | `api.Pets.Toys.delete`  |
//! | GET    | `/{id}`                      | `api.get`               |
//!
//! [`HandlerRegistry`] maps identifiers to axum handlers and tries the
//! configured [`CandidateStrategy`] list in order until one is registered.
//!
mod registry;

pub use registry::*;

use {
    crate::{config::ApiConfig, utils::title_case},
    http::Method,
    regex::Regex,
    std::sync::LazyLock,
};

static PARAMETER_REGEXP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{[^{}]+\}").unwrap());

/// One operation of an OpenAPI document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDescriptor {
    /// Path template with `{param}` segments.
    pub path: String,
    pub method: Method,
    /// Explicit `operationId`, if the document has one.
    pub operation_id: Option<String>,
    /// `x-openapi-router-controller` of the operation or its path item.
    pub router_controller: Option<String>,
}

impl RouteDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method,
            operation_id: None,
            router_controller: None,
        }
    }

    pub fn with_operation_id(mut self, operation_id: impl Into<String>) -> Self {
        self.operation_id = Some(operation_id.into());
        self
    }

    pub fn with_router_controller(mut self, controller: impl Into<String>) -> Self {
        self.router_controller = Some(controller.into());
        self
    }
}

/// Shape of a candidate identifier tried against the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateStrategy {
    /// The identifier as derived, e.g. `api.Pets.Toys.get`.
    Nested,
    /// `api.pets.toys.get`
    NestedLowercase,
    /// Intermediate module dots collapsed: `api.PetsToys.get`.
    Flattened,
    /// `api.petstoys.get`
    FlattenedLowercase,
}

impl CandidateStrategy {
    pub const DEFAULT_ORDER: [CandidateStrategy; 4] = [
        CandidateStrategy::Nested,
        CandidateStrategy::NestedLowercase,
        CandidateStrategy::Flattened,
        CandidateStrategy::FlattenedLowercase,
    ];

    /// Applies the strategy to a derived identifier.
    pub fn apply(self, operation_id: &str, default_module_name: &str) -> String {
        match self {
            CandidateStrategy::Nested => operation_id.to_string(),
            CandidateStrategy::NestedLowercase => operation_id.to_lowercase(),
            CandidateStrategy::Flattened => flatten(operation_id, default_module_name),
            CandidateStrategy::FlattenedLowercase => {
                flatten(operation_id, default_module_name).to_lowercase()
            }
        }
    }
}

/// Collapses every dot after the `default_module_name.` prefix except the
/// one in front of the function name. Identifiers outside the default
/// module are returned unchanged.
fn flatten(operation_id: &str, default_module_name: &str) -> String {
    let prefix = format!("{default_module_name}.");
    let Some(rest) = operation_id.strip_prefix(&prefix) else {
        return operation_id.to_string();
    };
    match rest.rsplit_once('.') {
        Some((modules, function)) => format!("{prefix}{}.{function}", modules.replace('.', "")),
        None => operation_id.to_string(),
    }
}

/// Derives handler identifiers with REST semantics for nested resources.
#[derive(Debug, Clone)]
pub struct MultipleResourceResolver {
    default_module_name: String,
    collection_endpoint_name: String,
    strategies: Vec<CandidateStrategy>,
}

impl MultipleResourceResolver {
    pub fn new(default_module_name: impl Into<String>) -> Self {
        Self {
            default_module_name: default_module_name.into(),
            collection_endpoint_name: "search".into(),
            strategies: CandidateStrategy::DEFAULT_ORDER.to_vec(),
        }
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(&config.default_module_name)
            .with_collection_endpoint_name(&config.collection_endpoint_name)
    }

    pub fn with_collection_endpoint_name(mut self, name: impl Into<String>) -> Self {
        self.collection_endpoint_name = name.into();
        self
    }

    /// Replaces the ordered list of candidate strategies.
    pub fn with_strategies(mut self, strategies: impl IntoIterator<Item = CandidateStrategy>) -> Self {
        self.strategies = strategies.into_iter().collect();
        self
    }

    pub fn default_module_name(&self) -> &str {
        &self.default_module_name
    }

    pub fn collection_endpoint_name(&self) -> &str {
        &self.collection_endpoint_name
    }

    pub fn strategies(&self) -> &[CandidateStrategy] {
        &self.strategies
    }

    /// The identifier of `route`.
    ///
    /// An explicit `operation_id` wins (qualified by the router controller
    /// when one is set); otherwise the identifier is derived from the path.
    pub fn resolve_operation_id(&self, route: &RouteDescriptor) -> String {
        match (&route.operation_id, &route.router_controller) {
            (Some(operation_id), Some(controller)) => format!("{controller}.{operation_id}"),
            (Some(operation_id), None) => operation_id.clone(),
            _ => self.resolve_operation_id_using_rest_semantics(route),
        }
    }

    /// Derives `controller.function` from the path segments and method.
    pub fn resolve_operation_id_using_rest_semantics(&self, route: &RouteDescriptor) -> String {
        let mut resources = Vec::new();
        let mut count_parameters = 0usize;
        for segment in route.path.split('/').filter(|s| !s.is_empty()) {
            if PARAMETER_REGEXP.is_match(segment) {
                count_parameters += 1;
            } else {
                resources.push(title_case(segment).replace('-', "_"));
            }
        }

        let controller = match &route.router_controller {
            Some(controller) => controller.clone(),
            None if resources.is_empty() => self.default_module_name.clone(),
            None => format!("{}.{}", self.default_module_name, resources.join(".")),
        };

        let function = if route.method == Method::GET && resources.len() > count_parameters {
            self.collection_endpoint_name.clone()
        } else {
            route.method.as_str().to_ascii_lowercase()
        };

        format!("{controller}.{function}")
    }

    /// Candidate identifiers in strategy order, without duplicates.
    pub fn candidates(&self, route: &RouteDescriptor) -> Vec<String> {
        let operation_id = self.resolve_operation_id(route);
        let mut candidates: Vec<String> = Vec::with_capacity(self.strategies.len());
        for strategy in &self.strategies {
            let candidate = strategy.apply(&operation_id, &self.default_module_name);
            if !candidates.contains(&candidate) {
                candidates.push(candidate);
            }
        }
        candidates
    }
}

impl Default for MultipleResourceResolver {
    fn default() -> Self {
        Self::new("api")
    }
}
