//! JSON endpoint toolkit.
//!
//! Declarative routes, typed input binding, browser-cache negotiation, CORS,
//! and panic containment for JSON HTTP services built on axum.
//!
//! # Architecture Overview
//!
//! ```text
//!  Client ──▶ request id ─▶ trace ─▶ admission limit ─▶ axum dispatch
//!                                                          │
//!                      wrappers (instrument, circuit breaker, ...)
//!                                                          │
//!                                                          ▼
//!            ┌──────────────────── JsonHandler ──────────────────────┐
//!            │ log start → CORS → cache negotiation ─┬─ 304          │
//!            │                                       └─ bind → execute│
//!            │                       (panic → 500) → format → log end │
//!            └────────────────────────────────────────────────────────┘
//! ```

pub mod binding;
pub mod config;
pub mod fibonacci;
pub mod handler;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod pipeline;
pub mod resilience;
pub mod routing;

pub use binding::{BindError, Binder};
pub use config::ServiceConfig;
pub use handler::{Handler, InputAccessor};
pub use http::{HttpServer, Response};
pub use lifecycle::Shutdown;
pub use routing::{Route, RouteGroup, RouterError, RouterMaker};
