//! Handler contract.
//!
//! # Data Flow
//! ```text
//! pipeline
//!     → Endpoint::call(binder)          (type-erased, one per route)
//!     → Handler::execute(accessor)
//!         → accessor.get()              (runs Handler::input against the binder)
//!         → Ok(input) | Err(400 response)
//!     → Response
//! ```
//!
//! # Design Decisions
//! - `input` is structural: allocate a record, issue directives, return it
//! - `execute` is the only place that reaches into business logic
//! - A binding failure is handed back as a ready-made response; handlers
//!   return it unchanged

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::BoxFuture;

use crate::binding::{BindError, Binder};
use crate::http::Response;

/// One endpoint's input shape and business logic.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Per-request input record.
    type Input: Send + 'static;

    /// Allocate an empty record and issue the binding directives for it.
    fn input(&self, binder: &mut Binder) -> Self::Input;

    /// Produce the response for one request.
    async fn execute(&self, input: InputAccessor<Self::Input>) -> Response;
}

/// Deferred access to a handler's bound input.
pub struct InputAccessor<I> {
    resolve: Box<dyn FnOnce() -> Result<I, BindError> + Send>,
}

impl<I: Send + 'static> InputAccessor<I> {
    pub fn new<F>(resolve: F) -> Self
    where
        F: FnOnce() -> Result<I, BindError> + Send + 'static,
    {
        Self {
            resolve: Box::new(resolve),
        }
    }

    /// An accessor over an already-built input.
    pub fn ready(input: I) -> Self {
        Self::new(move || Ok(input))
    }

    /// An accessor that reports a binding failure.
    pub fn failed(err: BindError) -> Self {
        Self::new(move || Err(err))
    }
}

impl<I> InputAccessor<I> {
    /// Bind and return the input, or the 400 response for a binding failure.
    pub fn get(self) -> Result<I, Response> {
        (self.resolve)().map_err(|err| Response::bad_request(err.to_string()))
    }
}

/// A handler with its input type erased, as stored in routes.
pub trait Endpoint: Send + Sync {
    fn call(&self, binder: Binder) -> BoxFuture<'_, Response>;
}

struct HandlerEndpoint<H>(Arc<H>);

impl<H: Handler> Endpoint for HandlerEndpoint<H> {
    fn call(&self, binder: Binder) -> BoxFuture<'_, Response> {
        let handler = Arc::clone(&self.0);
        let accessor = InputAccessor::new(move || {
            let mut binder = binder;
            let input = handler.input(&mut binder);
            binder.finish(input)
        });
        self.0.execute(accessor)
    }
}

/// Erase a handler's input type.
pub fn endpoint<H: Handler>(handler: H) -> Arc<dyn Endpoint> {
    Arc::new(HandlerEndpoint(Arc::new(handler)))
}
