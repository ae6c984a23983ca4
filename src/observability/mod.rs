//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Pipelines and wrappers produce:
//!     → logging.rs (structured request lifecycle events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID (`x-request-id`) appears on every lifecycle event
//! - Metrics are cheap (atomic increments) and no-ops until a recorder is installed

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, TracingLogger};
