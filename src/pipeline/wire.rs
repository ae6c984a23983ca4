//! Wire-level handlers and wrapper composition.
//!
//! A [`WireHandler`] turns an HTTP request into an HTTP response. Wrappers
//! take a route's path and the handler built so far and return a new one;
//! they are folded in registration order, so the first wrapper sits closest
//! to the pipeline and the last one sees the request first.

use std::future::Future;
use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use futures_util::future::{BoxFuture, FutureExt};

/// Future returned by a wire handler.
pub type WireFuture = BoxFuture<'static, axum::response::Response>;

/// A cloneable request → response function.
#[derive(Clone)]
pub struct WireHandler {
    inner: Arc<dyn Fn(Request<Body>) -> WireFuture + Send + Sync>,
}

impl WireHandler {
    pub fn new<F, Fut>(handler: F) -> Self
    where
        F: Fn(Request<Body>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = axum::response::Response> + Send + 'static,
    {
        Self {
            inner: Arc::new(move |request: Request<Body>| -> WireFuture {
                handler(request).boxed()
            }),
        }
    }

    pub fn call(&self, request: Request<Body>) -> WireFuture {
        (self.inner)(request)
    }
}

impl std::fmt::Debug for WireHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WireHandler").finish_non_exhaustive()
    }
}

/// `(route path, handler) → handler`.
pub type WrapperFunc = Arc<dyn Fn(&str, WireHandler) -> WireHandler + Send + Sync>;

/// Box a closure as a [`WrapperFunc`].
pub fn wrapper<F>(wrap: F) -> WrapperFunc
where
    F: Fn(&str, WireHandler) -> WireHandler + Send + Sync + 'static,
{
    Arc::new(wrap)
}

/// Apply `wrappers` around `base`, first to last.
pub fn wrap_all(path: &str, base: WireHandler, wrappers: &[WrapperFunc]) -> WireHandler {
    wrappers
        .iter()
        .fold(base, |handler, wrap| wrap(path, handler))
}
