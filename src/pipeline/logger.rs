//! Request lifecycle reporting contract.

use std::any::Any;
use std::time::{Duration, Instant};

use axum::extract::MatchedPath;
use axum::http::request::Parts;
use axum::http::{Method, Uri};

use crate::http::request::X_REQUEST_ID;
use crate::http::Response;

/// What the logger sees of a request.
#[derive(Debug, Clone)]
pub struct RequestInfo {
    pub method: Method,
    pub uri: Uri,
    /// Route pattern the router matched, when known.
    pub route: Option<String>,
    pub request_id: Option<String>,
    pub started: Instant,
}

impl RequestInfo {
    pub fn from_parts(parts: &Parts) -> Self {
        Self {
            method: parts.method.clone(),
            uri: parts.uri.clone(),
            route: parts
                .extensions
                .get::<MatchedPath>()
                .map(|path| path.as_str().to_owned()),
            request_id: parts
                .headers
                .get(X_REQUEST_ID)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned),
            started: Instant::now(),
        }
    }

    pub fn request_id(&self) -> &str {
        self.request_id.as_deref().unwrap_or("unknown")
    }

    pub fn route(&self) -> &str {
        self.route.as_deref().unwrap_or_else(|| self.uri.path())
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Receives pipeline lifecycle events.
pub trait RequestLogger: Send + Sync {
    fn log_start(&self, request: &RequestInfo);

    fn log_end(&self, request: &RequestInfo, response: &Response);

    /// A fault escaped `execute` and was replaced by `response`. `fault` is
    /// the raw panic payload.
    fn log_fault(&self, request: &RequestInfo, response: &Response, fault: &(dyn Any + Send));
}

/// Text of a panic payload, for payloads raised with a message.
pub fn fault_message(fault: &(dyn Any + Send)) -> Option<&str> {
    fault
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| fault.downcast_ref::<String>().map(String::as_str))
}
