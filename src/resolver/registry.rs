use {
    super::{MultipleResourceResolver, RouteDescriptor},
    crate::{Error, Result},
    axum::{
        handler::Handler,
        routing::{MethodFilter, MethodRouter, on},
    },
    std::{collections::HashMap, fmt, sync::Arc},
};

/// Builds the method router of a handler for a given method filter.
pub type HandlerFactory<S> = Arc<dyn Fn(MethodFilter) -> MethodRouter<S> + Send + Sync>;

/// Handlers addressable by identifier.
///
/// ```rust
/// use axum::routing::on;
/// use axum_openapi_plus::{HandlerRegistry, Optimize};
///
/// async fn list_pets() -> &'static str { "[]" }
/// async fn get_pet() -> &'static str { "{}" }
///
/// let registry = HandlerRegistry::<()>::new()
///     .with_handler("api.Pets.get", get_pet)
///     .with_factory("api.Pets.search", |filter| {
///         on(filter, list_pets).layer(Optimize::cache())
///     });
/// assert!(registry.contains("api.Pets.search"));
/// ```
pub struct HandlerRegistry<S = ()> {
    handlers: HashMap<String, HandlerFactory<S>>,
}

impl<S> HandlerRegistry<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registers an axum handler under `id`.
    pub fn register<H, T>(&mut self, id: impl Into<String>, handler: H) -> &mut Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.register_factory(id, move |filter| on(filter, handler.clone()))
    }

    /// Registers a function producing the method router for `id`. Use this
    /// to attach per-route layers.
    pub fn register_factory<F>(&mut self, id: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(MethodFilter) -> MethodRouter<S> + Send + Sync + 'static,
    {
        let id = id.into();
        if self.handlers.insert(id.clone(), Arc::new(factory)).is_some() {
            tracing::warn!(id, "Replacing registered handler");
        }
        self
    }

    pub fn with_handler<H, T>(mut self, id: impl Into<String>, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.register(id, handler);
        self
    }

    pub fn with_factory<F>(mut self, id: impl Into<String>, factory: F) -> Self
    where
        F: Fn(MethodFilter) -> MethodRouter<S> + Send + Sync + 'static,
    {
        self.register_factory(id, factory);
        self
    }

    pub fn contains(&self, id: &str) -> bool {
        self.handlers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Looks up a single identifier.
    pub fn lookup(&self, id: &str) -> Result<HandlerFactory<S>> {
        self.handlers
            .get(id)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("no handler registered as '{id}'")))
    }

    /// Tries every candidate identifier of `route` in order and returns the
    /// first registered one.
    pub fn resolve(
        &self,
        resolver: &MultipleResourceResolver,
        route: &RouteDescriptor,
    ) -> Result<Resolution<S>> {
        let operation_id = resolver.resolve_operation_id(route);
        let attempted = resolver.candidates(route);
        let mut last = None;
        for candidate in &attempted {
            match self.lookup(candidate) {
                Ok(factory) => {
                    tracing::debug!(
                        method = %route.method,
                        path = %route.path,
                        operation_id,
                        handler = candidate,
                        "Resolved operation"
                    );
                    return Ok(Resolution {
                        handler_id: candidate.clone(),
                        operation_id,
                        factory,
                    });
                }
                Err(error) => last = Some(error),
            }
        }
        Err(Error::resolution(attempted, last))
    }
}

impl<S> Default for HandlerRegistry<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S> fmt::Debug for HandlerRegistry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<_> = self.handlers.keys().collect();
        ids.sort();
        f.debug_struct("HandlerRegistry").field("handlers", &ids).finish()
    }
}

/// A successfully resolved operation.
pub struct Resolution<S = ()> {
    /// Identifier derived from the route.
    pub operation_id: String,
    /// Candidate that matched a registered handler.
    pub handler_id: String,
    factory: HandlerFactory<S>,
}

impl<S> Resolution<S> {
    /// The handler's method router, restricted to `filter`.
    pub fn method_router(&self, filter: MethodFilter) -> MethodRouter<S> {
        (self.factory)(filter)
    }
}

impl<S> fmt::Debug for Resolution<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolution")
            .field("operation_id", &self.operation_id)
            .field("handler_id", &self.handler_id)
            .finish_non_exhaustive()
    }
}
