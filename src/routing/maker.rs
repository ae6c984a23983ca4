//! Router assembly.
//!
//! # Responsibilities
//! - Validate the declarative route table
//! - Build one pipeline per route with its own cache policy
//! - Fold the registered wrappers around each pipeline
//! - Mount diagnostics when profiling is on

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::routing::{MethodFilter, MethodRouter};
use axum::Router;

use crate::binding::DEFAULT_BODY_LIMIT;
use crate::pipeline::{
    wrap_all, CachePolicy, Cors, JsonHandler, RequestLogger, WireHandler, WrapperFunc,
};

use super::diagnostics::{self, RouteSummary, DEBUG_ROUTES_PATH, DEBUG_RUNTIME_PATH};
use super::route::{Route, RouteGroup};

/// Route table problems detected at startup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouterError {
    #[error("route name `{0}` is registered more than once")]
    DuplicateName(String),

    #[error("{method} {path} is registered more than once")]
    DuplicateRoute { method: Method, path: String },

    #[error("{path} conflicts with {existing}: parameters must share names")]
    ConflictingRoute { path: String, existing: String },

    #[error("invalid pattern `{pattern}`: {reason}")]
    InvalidPattern {
        pattern: String,
        reason: &'static str,
    },

    #[error("method {0} cannot be routed")]
    UnsupportedMethod(Method),
}

/// Builder translating route groups into an axum router.
pub struct RouterMaker {
    cache: CachePolicy,
    cors: Arc<dyn Cors>,
    logger: Arc<dyn RequestLogger>,
    wrappers: Vec<WrapperFunc>,
    groups: Vec<RouteGroup>,
    body_limit: usize,
    profiling: bool,
}

impl RouterMaker {
    pub fn new(cache: CachePolicy, cors: Arc<dyn Cors>, logger: Arc<dyn RequestLogger>) -> Self {
        Self {
            cache,
            cors,
            logger,
            wrappers: Vec::new(),
            groups: Vec::new(),
            body_limit: DEFAULT_BODY_LIMIT,
            profiling: false,
        }
    }

    /// Register a wrapper. The first registered sits closest to the pipeline.
    pub fn wrapper(mut self, wrapper: WrapperFunc) -> Self {
        self.wrappers.push(wrapper);
        self
    }

    pub fn group(mut self, group: RouteGroup) -> Self {
        self.groups.push(group);
        self
    }

    pub fn groups(mut self, groups: impl IntoIterator<Item = RouteGroup>) -> Self {
        self.groups.extend(groups);
        self
    }

    pub fn body_limit(mut self, body_limit: usize) -> Self {
        self.body_limit = body_limit;
        self
    }

    /// Mount `/debug/routes` and `/debug/runtime`.
    pub fn profiling(mut self, enabled: bool) -> Self {
        self.profiling = enabled;
        self
    }

    /// Validate the table and produce the router.
    pub fn build(self) -> Result<Router, RouterError> {
        let mut names = HashSet::new();
        let mut keys = HashSet::new();
        let mut shapes: HashMap<String, String> = HashMap::new();
        let mut paths: BTreeMap<String, MethodRouter> = BTreeMap::new();
        let mut summaries = Vec::new();

        for group in &self.groups {
            validate_pattern(&group.prefix, true)?;

            for route in &group.routes {
                validate_pattern(&route.pattern, false)?;
                let path = join_path(&group.prefix, &route.pattern);
                validate_pattern(&path, false)?;

                if !names.insert(route.name.clone()) {
                    return Err(RouterError::DuplicateName(route.name.clone()));
                }
                let reserved = self.profiling
                    && [DEBUG_ROUTES_PATH, DEBUG_RUNTIME_PATH].contains(&path.as_str());
                if reserved || !keys.insert((route.method.clone(), path.clone())) {
                    return Err(RouterError::DuplicateRoute {
                        method: route.method.clone(),
                        path,
                    });
                }
                let existing = shapes.entry(shape(&path)).or_insert_with(|| path.clone());
                if *existing != path {
                    return Err(RouterError::ConflictingRoute {
                        path,
                        existing: existing.clone(),
                    });
                }
                let filter = MethodFilter::try_from(route.method.clone())
                    .map_err(|_| RouterError::UnsupportedMethod(route.method.clone()))?;

                let cache = self.cache.for_route(route.use_cache, route.cache_override);
                let handler = self.wire_handler(route, &path, cache);
                let method_router = paths.remove(&path).unwrap_or_default();
                paths.insert(
                    path.clone(),
                    method_router.on(filter, move |request: Request<Body>| handler.call(request)),
                );

                tracing::debug!(
                    name = %route.name,
                    method = %route.method,
                    path = %path,
                    cached = cache.enabled,
                    "Route registered"
                );
                summaries.push(RouteSummary {
                    name: route.name.clone(),
                    method: route.method.to_string(),
                    path,
                    cached: cache.enabled,
                    max_age_secs: cache.enabled.then(|| cache.max_age_secs()),
                });
            }
        }

        let mut router = paths
            .into_iter()
            .fold(Router::new(), |router, (path, method_router)| {
                router.route(&path, method_router)
            });

        if self.profiling {
            router = router.merge(diagnostics::router(summaries));
        }

        Ok(router)
    }

    fn wire_handler(&self, route: &Route, path: &str, cache: CachePolicy) -> WireHandler {
        let pipeline = JsonHandler::new(
            Arc::clone(&route.handler),
            Arc::clone(&self.logger),
            Arc::clone(&self.cors),
            cache,
        )
        .with_body_limit(self.body_limit)
        .into_wire();

        wrap_all(path, pipeline, &self.wrappers)
    }
}

/// Join a group prefix and a route pattern.
///
/// `("/api", "/")` → `/api`, `("/", "/items")` → `/items`, `("", "/")` → `/`.
pub fn join_path(prefix: &str, pattern: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let pattern = pattern.trim_start_matches('/');
    match (prefix.is_empty(), pattern.is_empty()) {
        (true, true) => "/".to_owned(),
        (false, true) => prefix.to_owned(),
        _ => format!("{prefix}/{pattern}"),
    }
}

fn validate_pattern(pattern: &str, is_prefix: bool) -> Result<(), RouterError> {
    let invalid = |reason| RouterError::InvalidPattern {
        pattern: pattern.to_owned(),
        reason,
    };

    if pattern.is_empty() && is_prefix {
        return Ok(());
    }
    if !pattern.starts_with('/') {
        return Err(invalid("must start with `/`"));
    }

    let mut captures = HashSet::new();
    for segment in pattern.split('/') {
        if !(segment.contains('{') || segment.contains('}')) {
            continue;
        }
        let Some(name) = segment
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
        else {
            return Err(invalid("parameters must span a whole segment"));
        };
        if is_prefix && name.starts_with('*') {
            return Err(invalid("a prefix cannot end in a wildcard"));
        }
        let name = name.strip_prefix('*').unwrap_or(name);
        if name.is_empty() {
            return Err(invalid("parameters need a name"));
        }
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(invalid("typed or regex parameters are not supported"));
        }
        if !captures.insert(name) {
            return Err(invalid("parameter names must be unique"));
        }
    }

    Ok(())
}

/// Path with captures erased. Two paths with the same shape but different
/// capture names cannot share a router.
fn shape(path: &str) -> String {
    path.split('/')
        .map(|segment| if segment.starts_with('{') { "{}" } else { segment })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("/api", "/"), "/api");
        assert_eq!(join_path("/", "/fibonacci"), "/fibonacci");
        assert_eq!(join_path("", "/"), "/");
        assert_eq!(join_path("/", "/"), "/");
        assert_eq!(join_path("/api/", "/items/{id}"), "/api/items/{id}");
    }

    #[test]
    fn test_validate_pattern() {
        assert!(validate_pattern("/items/{id}", false).is_ok());
        assert!(validate_pattern("/files/{*rest}", false).is_ok());
        assert!(validate_pattern("", true).is_ok());

        let err = validate_pattern("items", false).unwrap_err();
        assert_eq!(err.to_string(), "invalid pattern `items`: must start with `/`");

        assert!(matches!(
            validate_pattern("/items/{id:[0-9]+}", false),
            Err(RouterError::InvalidPattern {
                reason: "typed or regex parameters are not supported",
                ..
            })
        ));
        assert!(validate_pattern("/items/x{id}", false).is_err());
        assert!(validate_pattern("/items/{}", false).is_err());
        assert!(validate_pattern("/files/{*rest}", true).is_err());

        let err = validate_pattern("/a/{id}/{id}", false).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid pattern `/a/{id}/{id}`: parameter names must be unique"
        );
        assert!(validate_pattern("/a/{id}/{*id}", false).is_err());
    }

    #[test]
    fn test_shape_erases_parameter_names() {
        assert_eq!(shape("/items/{id}"), shape("/items/{key}"));
        assert_ne!(shape("/items/{id}"), shape("/items/all"));
        assert_eq!(shape("/files/{*rest}"), "/files/{}");
    }
}
