//! Request pipeline subsystem.
//!
//! # Data Flow
//! ```text
//! Request (already routed)
//!     → logger.rs (log_start)
//!     → cors.rs (Access-Control-Allow-* headers)
//!     → cache.rs (Etag / Cache-Control, 304 short-circuit)
//!     → json_handler.rs (bind, execute behind fault boundary, write JSON)
//!     → logger.rs (log_end)
//!
//! Route assembly:
//!     JsonHandler::into_wire()
//!     → wire.rs (fold WrapperFuncs: metrics, circuit breaker, ...)
//!     → bound to method + path by the router
//! ```
//!
//! # Design Decisions
//! - No cross-request mutable state; cache policy and CORS map are read-only
//! - No timeouts or admission control here; those belong to downstream
//!   clients and the host server

pub mod cache;
pub mod cors;
pub mod json_handler;
pub mod logger;
pub mod wire;

pub use cache::{CachePolicy, Negotiation, VersionTag};
pub use cors::{Cors, CorsHeaders};
pub use json_handler::JsonHandler;
pub use logger::{fault_message, RequestInfo, RequestLogger};
pub use wire::{wrap_all, wrapper, WireFuture, WireHandler, WrapperFunc};
