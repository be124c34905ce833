//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and the upstream origin
//! - Validate value ranges (timeouts > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderValue;
use url::Url;

use crate::config::schema::ProxyConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("upstream.origin: {0}")]
    InvalidOrigin(String),

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("cors.allowed_origins: {0:?} is not a valid header value")]
    InvalidCorsOrigin(String),

    #[error("observability.log_level: unknown level {0:?}")]
    InvalidLogLevel(String),
}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if let Err(reason) = check_origin(&config.upstream.origin) {
        errors.push(ValidationError::InvalidOrigin(reason));
    }

    let timeouts = [
        ("timeouts.upstream_secs", config.timeouts.upstream_secs),
        ("timeouts.connect_secs", config.timeouts.connect_secs),
        ("timeouts.pool_idle_secs", config.timeouts.pool_idle_secs),
    ];
    for (field, value) in timeouts {
        if value == 0 {
            errors.push(ValidationError::ZeroTimeout(field));
        }
    }

    for origin in &config.cors.allowed_origins {
        // Wildcards cannot be combined with credentials; leave the list empty instead.
        if origin == "*" || HeaderValue::from_str(origin).is_err() {
            errors.push(ValidationError::InvalidCorsOrigin(origin.clone()));
        }
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::InvalidLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// The outbound client speaks plain HTTP only, and the origin must be a bare
/// base URL since `/api/<path>` is appended to it.
fn check_origin(origin: &str) -> Result<(), String> {
    let url = Url::parse(origin).map_err(|e| format!("{origin:?} is not a URL ({e})"))?;

    if url.scheme() != "http" {
        return Err(format!("unsupported scheme {:?}, expected \"http\"", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err(format!("{origin:?} has no host"));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(format!("{origin:?} must not carry a query or fragment"));
    }
    Ok(())
}
