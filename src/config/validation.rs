//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits > 0, addresses parse)
//! - Check CORS values are legal header values
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderValue;

use crate::config::schema::ServiceConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field}: `{value}` is not a socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field}: `{value}` is not a valid header value")]
    InvalidHeaderValue { field: &'static str, value: String },
}

/// Check a configuration, collecting every problem.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(
        &mut errors,
        "listener.bind_address",
        &config.listener.bind_address,
    );
    check_positive(
        &mut errors,
        "listener.max_connections",
        config.listener.max_connections as u64,
    );
    check_positive(
        &mut errors,
        "binding.max_body_bytes",
        config.binding.max_body_bytes as u64,
    );

    if config.cache.enabled {
        check_positive(&mut errors, "cache.max_age_secs", config.cache.max_age_secs);
    }

    if config.cors.enabled {
        for (field, value) in [
            ("cors.origin", &config.cors.origin),
            ("cors.methods", &config.cors.methods),
            ("cors.headers", &config.cors.headers),
        ] {
            if HeaderValue::from_str(value).is_err() {
                errors.push(ValidationError::InvalidHeaderValue {
                    field,
                    value: value.clone(),
                });
            }
        }
    }

    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if config.circuit_breaker.enabled {
        let breaker = &config.circuit_breaker;
        check_positive(
            &mut errors,
            "circuit_breaker.failure_threshold",
            breaker.failure_threshold.into(),
        );
        check_positive(
            &mut errors,
            "circuit_breaker.success_threshold",
            breaker.success_threshold.into(),
        );
        check_positive(&mut errors, "circuit_breaker.cooldown_secs", breaker.cooldown_secs);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

fn check_positive(errors: &mut Vec<ValidationError>, field: &'static str, value: u64) {
    if value == 0 {
        errors.push(ValidationError::Zero { field });
    }
}
