//! Declarative route table entries.

use std::sync::Arc;
use std::time::Duration;

use axum::http::Method;

use crate::handler::{endpoint, Endpoint, Handler};

/// One endpoint bound to a method and path pattern.
#[derive(Clone)]
pub struct Route {
    /// Unique across the whole service.
    pub name: String,
    pub method: Method,
    /// Path relative to the group prefix, e.g. `/items/{id}`.
    pub pattern: String,
    pub handler: Arc<dyn Endpoint>,
    pub use_cache: bool,
    /// Replaces the service max-age when positive.
    pub cache_override: Option<Duration>,
}

impl Route {
    pub fn new<H: Handler>(
        name: impl Into<String>,
        method: Method,
        pattern: impl Into<String>,
        handler: H,
    ) -> Self {
        Self::from_endpoint(name, method, pattern, endpoint(handler))
    }

    pub fn from_endpoint(
        name: impl Into<String>,
        method: Method,
        pattern: impl Into<String>,
        handler: Arc<dyn Endpoint>,
    ) -> Self {
        Self {
            name: name.into(),
            method,
            pattern: pattern.into(),
            handler,
            use_cache: false,
            cache_override: None,
        }
    }

    pub fn get<H: Handler>(name: impl Into<String>, pattern: impl Into<String>, handler: H) -> Self {
        Self::new(name, Method::GET, pattern, handler)
    }

    pub fn post<H: Handler>(name: impl Into<String>, pattern: impl Into<String>, handler: H) -> Self {
        Self::new(name, Method::POST, pattern, handler)
    }

    pub fn put<H: Handler>(name: impl Into<String>, pattern: impl Into<String>, handler: H) -> Self {
        Self::new(name, Method::PUT, pattern, handler)
    }

    pub fn delete<H: Handler>(
        name: impl Into<String>,
        pattern: impl Into<String>,
        handler: H,
    ) -> Self {
        Self::new(name, Method::DELETE, pattern, handler)
    }

    /// Opt into browser caching with the service max-age.
    pub fn cached(mut self) -> Self {
        self.use_cache = true;
        self
    }

    /// Opt into browser caching with a route-specific max-age.
    pub fn cached_for(mut self, max_age: Duration) -> Self {
        self.use_cache = true;
        self.cache_override = Some(max_age);
        self
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("name", &self.name)
            .field("method", &self.method)
            .field("pattern", &self.pattern)
            .field("use_cache", &self.use_cache)
            .field("cache_override", &self.cache_override)
            .finish_non_exhaustive()
    }
}

/// Routes sharing a path prefix.
#[derive(Debug, Clone, Default)]
pub struct RouteGroup {
    pub prefix: String,
    pub routes: Vec<Route>,
}

impl RouteGroup {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            routes: Vec::new(),
        }
    }

    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }
}
