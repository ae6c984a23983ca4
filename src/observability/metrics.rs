//! Metrics collection and exposition.
//!
//! # Metrics
//! - `endpoint_requests_total` (counter): requests by route, method, status
//! - `endpoint_request_duration_seconds` (histogram): latency by route, method
//! - `endpoint_handler_faults_total` (counter): panics caught by the pipeline
//! - `endpoint_circuit_rejections_total` (counter): requests refused by an open breaker
//!
//! Recording is a no-op until [`init_metrics`] installs the Prometheus recorder.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::pipeline::{wrapper, WireHandler, WrapperFunc};

// ============================================================================
// Metric Names
// ============================================================================

/// Request counter.
pub const HTTP_REQUESTS_TOTAL: &str = "endpoint_requests_total";

/// Request duration histogram.
pub const HTTP_REQUEST_DURATION: &str = "endpoint_request_duration_seconds";

/// Handler fault counter.
pub const HTTP_HANDLER_FAULTS: &str = "endpoint_handler_faults_total";

/// Circuit breaker rejection counter.
pub const CIRCUIT_REJECTIONS: &str = "endpoint_circuit_rejections_total";

// ============================================================================
// Recorder
// ============================================================================

/// Install the Prometheus recorder and serve scrapes on `addr`.
///
/// Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    describe_metrics();
    tracing::info!(address = %addr, "Prometheus metrics exporter listening");
    Ok(())
}

/// Register metric descriptions with the installed recorder.
pub fn describe_metrics() {
    describe_counter!(HTTP_REQUESTS_TOTAL, "Total requests served");
    describe_histogram!(HTTP_REQUEST_DURATION, "Request duration in seconds");
    describe_counter!(HTTP_HANDLER_FAULTS, "Handler panics converted to 500");
    describe_counter!(CIRCUIT_REJECTIONS, "Requests rejected by an open circuit");
}

// ============================================================================
// Recording
// ============================================================================

pub fn record_request(route: &str, method: &str, status: u16, start: Instant) {
    let labels = [
        ("route", route.to_string()),
        ("method", method.to_string()),
        ("status", status.to_string()),
    ];
    counter!(HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(
        HTTP_REQUEST_DURATION,
        "route" => route.to_string(),
        "method" => method.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_fault(route: &str) {
    counter!(HTTP_HANDLER_FAULTS, "route" => route.to_string()).increment(1);
}

pub fn record_circuit_rejection(route: &str) {
    counter!(CIRCUIT_REJECTIONS, "route" => route.to_string()).increment(1);
}

/// Wrapper that records request count and latency for a route.
pub fn instrument() -> WrapperFunc {
    wrapper(|path, next| {
        let route = path.to_owned();
        WireHandler::new(move |request| {
            let next = next.clone();
            let route = route.clone();
            async move {
                let start = Instant::now();
                let method = request.method().to_string();
                let response = next.call(request).await;
                record_request(&route, &method, response.status().as_u16(), start);
                response
            }
        })
    })
}
