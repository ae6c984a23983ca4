//! Circuit breaker for route protection.
//!
//! # States
//! - Closed: normal operation, requests pass through
//! - Open: route assumed broken, requests fail fast with 503
//! - Half-Open: testing if the route recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive 5xx responses >= failure_threshold
//! Open → Half-Open: after cooldown
//! Half-Open → Closed: success_threshold probes succeed
//! Half-Open → Open: a probe fails
//! ```
//!
//! # Design Decisions
//! - Per-route circuit breaker (not global)
//! - Single probe in flight while Half-Open

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderValue, StatusCode};

use crate::config::CircuitBreakerConfig;
use crate::http::response::APPLICATION_JSON;
use crate::http::Response;
use crate::observability::metrics;
use crate::pipeline::{wrapper, WireHandler, WrapperFunc};

/// Message carried by fail-fast responses.
pub const UNAVAILABLE_MESSAGE: &str = "service temporarily unavailable";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug)]
struct Inner {
    state: CircuitState,
    failure_count: u32,
    success_count: u32,
    opened_at: Option<Instant>,
    probe_in_flight: bool,
}

/// Failure tracker for a single route.
#[derive(Debug)]
pub struct CircuitBreaker {
    failure_threshold: u32,
    success_threshold: u32,
    cooldown: Duration,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, cooldown: Duration, success_threshold: u32) -> Self {
        Self {
            failure_threshold: failure_threshold.max(1),
            success_threshold: success_threshold.max(1),
            cooldown,
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                failure_count: 0,
                success_count: 0,
                opened_at: None,
                probe_in_flight: false,
            }),
        }
    }

    pub fn from_config(config: &CircuitBreakerConfig) -> Self {
        Self::new(
            config.failure_threshold,
            Duration::from_secs(config.cooldown_secs),
            config.success_threshold,
        )
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    /// Ask to let a request through.
    ///
    /// The returned permit must be completed with [`Permit::record`]; a
    /// permit dropped unrecorded frees the half-open probe slot without
    /// counting as either outcome.
    pub fn try_acquire(self: &Arc<Self>) -> Option<Permit> {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => Some(Permit::new(self, false)),
            CircuitState::Open => {
                let cooled = inner
                    .opened_at
                    .is_some_and(|opened| opened.elapsed() >= self.cooldown);
                if !cooled {
                    return None;
                }
                tracing::info!("Circuit half-open, sending probe");
                inner.state = CircuitState::HalfOpen;
                inner.success_count = 0;
                inner.probe_in_flight = true;
                Some(Permit::new(self, true))
            }
            CircuitState::HalfOpen if inner.probe_in_flight => None,
            CircuitState::HalfOpen => {
                inner.probe_in_flight = true;
                Some(Permit::new(self, true))
            }
        }
    }

    fn record_success(&self, probe: bool) {
        let mut inner = self.lock();
        if probe {
            inner.probe_in_flight = false;
        }
        match inner.state {
            CircuitState::Closed => inner.failure_count = 0,
            CircuitState::HalfOpen if probe => {
                inner.success_count += 1;
                if inner.success_count >= self.success_threshold {
                    tracing::info!("Circuit closed");
                    inner.state = CircuitState::Closed;
                    inner.failure_count = 0;
                    inner.success_count = 0;
                    inner.opened_at = None;
                }
            }
            _ => {}
        }
    }

    fn record_failure(&self, probe: bool) {
        let mut inner = self.lock();
        if probe {
            inner.probe_in_flight = false;
        }
        match inner.state {
            CircuitState::Closed => {
                inner.failure_count += 1;
                if inner.failure_count >= self.failure_threshold {
                    tracing::warn!(failures = inner.failure_count, "Circuit opened");
                    inner.state = CircuitState::Open;
                    inner.opened_at = Some(Instant::now());
                }
            }
            CircuitState::HalfOpen if probe => {
                tracing::warn!("Probe failed, circuit re-opened");
                inner.state = CircuitState::Open;
                inner.success_count = 0;
                inner.opened_at = Some(Instant::now());
            }
            _ => {}
        }
    }

    fn release(&self, probe: bool) {
        if probe {
            self.lock().probe_in_flight = false;
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // The state stays consistent even if a holder panicked.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Admission granted by [`CircuitBreaker::try_acquire`].
#[derive(Debug)]
pub struct Permit {
    breaker: Arc<CircuitBreaker>,
    probe: bool,
    recorded: bool,
}

impl Permit {
    fn new(breaker: &Arc<CircuitBreaker>, probe: bool) -> Self {
        Self {
            breaker: Arc::clone(breaker),
            probe,
            recorded: false,
        }
    }

    /// Report the outcome of the admitted request.
    pub fn record(mut self, success: bool) {
        self.recorded = true;
        if success {
            self.breaker.record_success(self.probe);
        } else {
            self.breaker.record_failure(self.probe);
        }
    }
}

impl Drop for Permit {
    fn drop(&mut self) {
        if !self.recorded {
            self.breaker.release(self.probe);
        }
    }
}

/// Wrapper giving each route its own breaker. 5xx responses count as failures.
pub fn circuit_breaker(config: &CircuitBreakerConfig) -> WrapperFunc {
    let config = config.clone();
    wrapper(move |path, next| {
        let breaker = Arc::new(CircuitBreaker::from_config(&config));
        let route = path.to_owned();
        WireHandler::new(move |request| {
            let next = next.clone();
            let breaker = Arc::clone(&breaker);
            let route = route.clone();
            async move {
                let Some(permit) = breaker.try_acquire() else {
                    metrics::record_circuit_rejection(&route);
                    tracing::debug!(route = %route, "Circuit open, rejecting request");
                    return unavailable();
                };
                let response = next.call(request).await;
                permit.record(!response.status().is_server_error());
                response
            }
        })
    })
}

fn unavailable() -> axum::response::Response {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
    Response::error(StatusCode::SERVICE_UNAVAILABLE, UNAVAILABLE_MESSAGE).to_wire(headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::wrap_all;
    use axum::body::Body;
    use axum::http::Request;
    use axum::response::IntoResponse;
    use std::sync::atomic::{AtomicU16, AtomicUsize, Ordering};

    fn breaker(failures: u32, cooldown: Duration, successes: u32) -> Arc<CircuitBreaker> {
        Arc::new(CircuitBreaker::new(failures, cooldown, successes))
    }

    #[test]
    fn test_opens_after_threshold() {
        let cb = breaker(3, Duration::from_secs(60), 1);
        for _ in 0..2 {
            cb.try_acquire().unwrap().record(false);
        }
        assert_eq!(cb.state(), CircuitState::Closed);

        cb.try_acquire().unwrap().record(false);
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(cb.try_acquire().is_none());
    }

    #[test]
    fn test_success_resets_failure_count() {
        let cb = breaker(2, Duration::from_secs(60), 1);
        cb.try_acquire().unwrap().record(false);
        cb.try_acquire().unwrap().record(true);
        cb.try_acquire().unwrap().record(false);
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn test_half_open_admits_single_probe() {
        let cb = breaker(1, Duration::ZERO, 2);
        cb.try_acquire().unwrap().record(false);
        assert_eq!(cb.state(), CircuitState::Open);

        let probe = cb.try_acquire().unwrap();
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        assert!(cb.try_acquire().is_none());

        probe.record(true);
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        cb.try_acquire().unwrap().record(true);
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn test_failed_probe_reopens() {
        let cb = breaker(1, Duration::ZERO, 1);
        cb.try_acquire().unwrap().record(false);
        cb.try_acquire().unwrap().record(false);
        assert_eq!(cb.state(), CircuitState::Open);
    }

    #[test]
    fn test_dropped_probe_frees_slot() {
        let cb = breaker(1, Duration::ZERO, 1);
        cb.try_acquire().unwrap().record(false);
        drop(cb.try_acquire().unwrap());
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        assert!(cb.try_acquire().is_some());
    }

    #[tokio::test]
    async fn test_wrapper_fails_fast_with_json_503() {
        let calls = Arc::new(AtomicUsize::new(0));
        let status = Arc::new(AtomicU16::new(500));
        let base = {
            let calls = Arc::clone(&calls);
            let status = Arc::clone(&status);
            WireHandler::new(move |_request| {
                calls.fetch_add(1, Ordering::SeqCst);
                let code = StatusCode::from_u16(status.load(Ordering::SeqCst)).unwrap();
                async move { code.into_response() }
            })
        };
        let config = CircuitBreakerConfig {
            enabled: true,
            failure_threshold: 2,
            cooldown_secs: 60,
            success_threshold: 1,
        };
        let handler = wrap_all("/flaky", base, &[circuit_breaker(&config)]);
        let request = || Request::builder().uri("/flaky").body(Body::empty()).unwrap();

        for _ in 0..2 {
            let response = handler.call(request()).await;
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        }

        let rejected = handler.call(request()).await;
        assert_eq!(rejected.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(rejected.headers()[CONTENT_TYPE], APPLICATION_JSON);
        let body = axum::body::to_bytes(rejected.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(
            &body[..],
            b"{\"ErrorMessage\":\"service temporarily unavailable\"}\n"
        );
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
