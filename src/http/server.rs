//! HTTP server setup.
//!
//! # Responsibilities
//! - Derive cache policy, CORS headers, and wrappers from configuration
//! - Assemble the route table into an axum router
//! - Wire up outer layers (admission limit, request ID, tracing)
//! - Serve on a listener until shutdown is signalled

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServiceConfig;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::observability::{metrics, TracingLogger};
use crate::pipeline::{CachePolicy, Cors, CorsHeaders, RequestLogger};
use crate::resilience::circuit_breaker;
use crate::routing::{RouteGroup, RouterError, RouterMaker};

/// HTTP server for a set of route groups.
pub struct HttpServer {
    router: Router,
    config: ServiceConfig,
}

impl HttpServer {
    /// Build a server that logs through `tracing`.
    pub fn new(config: ServiceConfig, groups: Vec<RouteGroup>) -> Result<Self, RouterError> {
        Self::with_logger(config, groups, Arc::new(TracingLogger))
    }

    /// Build a server reporting request lifecycles to `logger`.
    pub fn with_logger(
        config: ServiceConfig,
        groups: Vec<RouteGroup>,
        logger: Arc<dyn RequestLogger>,
    ) -> Result<Self, RouterError> {
        let router = Self::build_router(&config, groups, logger)?;
        Ok(Self { router, config })
    }

    fn build_router(
        config: &ServiceConfig,
        groups: Vec<RouteGroup>,
        logger: Arc<dyn RequestLogger>,
    ) -> Result<Router, RouterError> {
        let cache = CachePolicy::from_config(&config.cache);
        let cors: Arc<dyn Cors> = Arc::new(CorsHeaders::from_config(&config.cors));

        tracing::info!(
            cache_enabled = cache.enabled,
            version_tag = cache.version.get(),
            max_age_secs = cache.max_age_secs(),
            cors_enabled = config.cors.enabled,
            profiling = config.profiling.enabled,
            "Building router"
        );

        let mut maker = RouterMaker::new(cache, cors, logger)
            .groups(groups)
            .body_limit(config.binding.max_body_bytes)
            .profiling(config.profiling.enabled);

        // Breaker inside instrumentation so fail-fast responses are counted too.
        if config.circuit_breaker.enabled {
            maker = maker.wrapper(circuit_breaker(&config.circuit_breaker));
        }
        maker = maker.wrapper(metrics::instrument());

        Ok(maker
            .build()?
            .layer(GlobalConcurrencyLimitLayer::new(
                config.listener.max_connections,
            ))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer()))
    }

    /// The fully layered router, for driving without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Serve on `listener` until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
