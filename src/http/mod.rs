//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum::serve, outer tower layers)
//!     → request.rs (assign / propagate x-request-id)
//!     → [routing: method + path → wrapped pipeline]
//!     → response.rs (status + JSON body → wire)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{UuidRequestId, X_REQUEST_ID};
pub use response::{ErrorBody, Response, APPLICATION_JSON};
pub use server::HttpServer;
