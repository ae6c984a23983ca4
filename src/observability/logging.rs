//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Report pipeline lifecycle events as structured log lines
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level when set
//! - Faults log at error level; ordinary completions at info

use std::any::Any;
use std::sync::Once;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;
use crate::http::Response;
use crate::pipeline::{fault_message, RequestInfo, RequestLogger};

static INIT: Once = Once::new();

/// Install the global subscriber. Later calls are no-ops.
pub fn init_logging(config: &ObservabilityConfig) {
    INIT.call_once(|| {
        let fallback = format!("endpoint_kit={level},tower_http={level}", level = config.log_level);
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

        let installed = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init();

        if installed.is_err() {
            tracing::debug!("global subscriber already installed");
        }
    });
}

/// [`RequestLogger`] backed by `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl RequestLogger for TracingLogger {
    fn log_start(&self, request: &RequestInfo) {
        tracing::debug!(
            request_id = %request.request_id(),
            method = %request.method,
            path = %request.uri.path(),
            route = %request.route(),
            "Request started"
        );
    }

    fn log_end(&self, request: &RequestInfo, response: &Response) {
        tracing::info!(
            request_id = %request.request_id(),
            method = %request.method,
            path = %request.uri.path(),
            route = %request.route(),
            status = response.status.as_u16(),
            elapsed_ms = request.elapsed().as_millis() as u64,
            "Request completed"
        );
    }

    fn log_fault(&self, request: &RequestInfo, response: &Response, fault: &(dyn Any + Send)) {
        let fault = fault_message(fault).unwrap_or("non-string panic payload");
        tracing::error!(
            request_id = %request.request_id(),
            method = %request.method,
            path = %request.uri.path(),
            route = %request.route(),
            status = response.status.as_u16(),
            fault = %fault,
            "Handler panicked"
        );
    }
}
