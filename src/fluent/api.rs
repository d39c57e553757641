//! Mounting OpenAPI operations onto the router.

use super::router::FluentRouter;
use crate::{
    Error, ErrorResponse, Result,
    openapi::{ApiSpec, load_specs},
    resolver::{HandlerRegistry, MultipleResourceResolver, RouteDescriptor},
};

use {
    axum::{
        Json, Router,
        routing::{MethodFilter, MethodRouter, on},
    },
    http::StatusCode,
};

impl<State> FluentRouter<State>
where
    State: Clone + Send + Sync + 'static,
{
    /// Mounts every operation of `spec`.
    ///
    /// Each operation is resolved against `registry` with `resolver` (see
    /// [`MultipleResourceResolver`]). Operations are mounted under
    /// `[api] base_path` if set, otherwise under the path of the document's
    /// first server (or `basePath`).
    ///
    /// # Errors
    ///
    /// Returns a `Resolution` error naming every candidate tried when an
    /// operation has no handler, unless `[api] resolver_error` is set, in which
    /// case that operation answers with the configured status instead.
    pub fn add_api(
        mut self,
        spec: &ApiSpec,
        resolver: &MultipleResourceResolver,
        registry: &HandlerRegistry<State>,
    ) -> Result<Self> {
        let stub_status = self.config.api.resolver_error_status();
        let mut api = Router::new();
        let mut mounted = 0;

        for route in spec.routes() {
            let filter = MethodFilter::try_from(route.method.clone()).map_err(|_| {
                Error::invalid_input(format!(
                    "unsupported method {} for {} in {}",
                    route.method,
                    route.path,
                    spec.source()
                ))
            })?;

            let method_router = match registry.resolve(resolver, &route) {
                Ok(resolution) => resolution.method_router(filter),
                Err(error) => match stub_status {
                    Some(status) => {
                        tracing::warn!(
                            method = %route.method,
                            path = %route.path,
                            %error,
                            status = status.as_u16(),
                            "No handler for operation, installing stub"
                        );
                        resolver_error_stub(&route, resolver, status, filter)
                    }
                    None => return Err(error),
                },
            };

            api = api.route(&route.path, method_router);
            mounted += 1;
        }

        let base_path = self
            .config
            .api
            .base_path
            .clone()
            .or_else(|| spec.base_path())
            .map(|base| base.trim_end_matches('/').to_string())
            .filter(|base| !base.is_empty());

        tracing::info!(
            source = spec.source(),
            title = spec.title(),
            base_path = base_path.as_deref().unwrap_or("/"),
            operations = mounted,
            "Mounted OpenAPI operations"
        );

        self.inner = match base_path {
            Some(base) => self.inner.nest(&base, api),
            None => self.inner.merge(api),
        };
        Ok(self)
    }

    /// Loads every document listed in `[api] spec` and mounts it with a
    /// resolver built from the `[api]` section.
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error when no document is configured, and
    /// any loading or resolution error.
    pub async fn add_api_from_config(self, registry: &HandlerRegistry<State>) -> Result<Self> {
        let locations = self.config.api.spec_locations().join(";");
        if locations.is_empty() {
            return Err(Error::config(
                "[api] spec is not set. Set it to one or more ';' separated OpenAPI documents.",
            ));
        }

        let resolver = MultipleResourceResolver::from_config(&self.config.api);
        let mut router = self;
        for spec in load_specs(&locations).await? {
            router = router.add_api(&spec, &resolver, registry)?;
        }
        Ok(router)
    }
}

/// Handler answering `status` with a JSON body naming the missing handler.
fn resolver_error_stub<State>(
    route: &RouteDescriptor,
    resolver: &MultipleResourceResolver,
    status: StatusCode,
    filter: MethodFilter,
) -> MethodRouter<State>
where
    State: Clone + Send + Sync + 'static,
{
    let body = ErrorResponse::new(
        status,
        "RESOLUTION_ERROR",
        format!(
            "{} {} has no handler",
            route.method, route.path
        ),
    )
    .with_details(format!("attempted: {}", resolver.candidates(route).join(", ")));

    on(filter, move || {
        let body = body.clone();
        async move { (status, Json(body)) }
    })
}
