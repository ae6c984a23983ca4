//! Runtime profiling endpoints.
//!
//! Plain axum handlers mounted beside the route table when profiling is
//! enabled. They bypass the JSON pipeline entirely.

use std::sync::Arc;
use std::time::Instant;

use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

pub const DEBUG_ROUTES_PATH: &str = "/debug/routes";
pub const DEBUG_RUNTIME_PATH: &str = "/debug/runtime";

/// A registered route as reported by `/debug/routes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteSummary {
    pub name: String,
    pub method: String,
    pub path: String,
    pub cached: bool,
    /// Effective max-age, present only for cached routes.
    pub max_age_secs: Option<u64>,
}

/// Scheduler state reported by `/debug/runtime`.
#[derive(Debug, Clone, Serialize)]
pub struct RuntimeSnapshot {
    pub workers: usize,
    pub alive_tasks: usize,
    pub global_queue_depth: usize,
    pub uptime_secs: u64,
}

impl RuntimeSnapshot {
    /// Sample the current Tokio runtime.
    pub fn capture(started: Instant) -> Self {
        let metrics = tokio::runtime::Handle::current().metrics();
        Self {
            workers: metrics.num_workers(),
            alive_tasks: metrics.num_alive_tasks(),
            global_queue_depth: metrics.global_queue_depth(),
            uptime_secs: started.elapsed().as_secs(),
        }
    }
}

pub(crate) fn router(routes: Vec<RouteSummary>) -> Router {
    let routes = Arc::new(routes);
    let started = Instant::now();

    Router::new()
        .route(
            DEBUG_ROUTES_PATH,
            get(move || {
                let routes = Arc::clone(&routes);
                async move { Json(routes.as_ref().clone()) }
            }),
        )
        .route(
            DEBUG_RUNTIME_PATH,
            get(move || async move { Json(RuntimeSnapshot::capture(started)) }),
        )
}
