//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup):
//!     RouteGroup[]
//!     → maker.rs (validate names, patterns, method+path keys)
//!     → per route: CachePolicy → JsonHandler → wrappers (fold)
//!     → one axum MethodRouter per joined path
//!     → Freeze as immutable axum::Router
//!
//! Incoming Request:
//!     → axum dispatch on (method, path)
//!     → wrapped pipeline, or axum's default 404 / 405
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Configuration mistakes (duplicate names, colliding keys) fail `build`,
//!   never a request
//! - Diagnostics live outside the pipeline: no binding, caching, or CORS

pub mod diagnostics;
pub mod maker;
pub mod route;

pub use diagnostics::{RouteSummary, RuntimeSnapshot, DEBUG_ROUTES_PATH, DEBUG_RUNTIME_PATH};
pub use maker::{join_path, RouterError, RouterMaker};
pub use route::{Route, RouteGroup};
