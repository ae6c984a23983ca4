//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to a route:
//!     → circuit_breaker.rs (fail fast while the route keeps returning 5xx)
//!     → [pipeline]
//!     → outcome recorded against the route's breaker
//! ```
//!
//! # Design Decisions
//! - One breaker per route path, installed as an ordinary wrapper
//! - The pipeline imposes no deadline; handlers own their timeouts

pub mod circuit_breaker;

pub use circuit_breaker::{circuit_breaker, CircuitBreaker, CircuitState};
