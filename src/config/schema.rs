//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::binding::DEFAULT_BODY_LIMIT;

/// Root configuration for the service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address, admission limit).
    pub listener: ListenerConfig,

    /// Browser-cache (Etag / max-age) settings shared by cached routes.
    pub cache: CacheConfig,

    /// Cross-origin response headers.
    pub cors: CorsConfig,

    /// Diagnostic endpoints.
    pub profiling: ProfilingConfig,

    /// Request input binding.
    pub binding: BindingConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Per-route circuit breaking.
    pub circuit_breaker: CircuitBreakerConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum requests in flight across all routes (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_connections: 10_000,
        }
    }
}

/// Browser-cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Emit cache headers on routes that opt in.
    pub enabled: bool,

    /// Default `max-age` in seconds.
    pub max_age_secs: u64,

    /// Deployed version used as the entity tag. Defaults to startup time.
    pub version_tag: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_age_secs: 3600,
            version_tag: None,
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    pub enabled: bool,

    /// `Access-Control-Allow-Origin`.
    pub origin: String,

    /// `Access-Control-Allow-Methods`.
    pub methods: String,

    /// `Access-Control-Allow-Headers`.
    pub headers: String,
}

/// Diagnostic routes configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ProfilingConfig {
    /// Serve `/debug/routes` and `/debug/runtime`.
    pub enabled: bool,
}

/// Input binding configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BindingConfig {
    /// Largest request body the binder buffers, in bytes.
    pub max_body_bytes: usize,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: DEFAULT_BODY_LIMIT,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Wrap every route in a breaker.
    pub enabled: bool,

    /// Consecutive 5xx responses that open the circuit.
    pub failure_threshold: u32,

    /// Seconds the circuit stays open before probing.
    pub cooldown_secs: u64,

    /// Successful probes needed to close the circuit again.
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            failure_threshold: 5,
            cooldown_secs: 30,
            success_threshold: 2,
        }
    }
}
