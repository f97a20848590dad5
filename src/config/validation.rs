//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals > 0, burst >= 1)
//! - Check header names/values and addresses parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::{HeaderName, HeaderValue};

use crate::config::schema::AppConfig;

/// Smallest token accepted, in random bytes.
const MIN_TOKEN_BYTES: usize = 16;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("not a socket address: {}", config.listener.bind_address),
        ));
    }

    let token = &config.token;
    if token.rotation_interval_secs == 0 {
        errors.push(ValidationError::new("token.rotation_interval_secs", "must be greater than 0"));
    }
    if token.token_bytes < MIN_TOKEN_BYTES {
        errors.push(ValidationError::new(
            "token.token_bytes",
            format!("must be at least {}", MIN_TOKEN_BYTES),
        ));
    }
    if token.cookie_name.is_empty() {
        errors.push(ValidationError::new("token.cookie_name", "must not be empty"));
    }
    if !token.cookie_path.starts_with('/') {
        errors.push(ValidationError::new("token.cookie_path", "must start with '/'"));
    }

    let rate = &config.rate_limit;
    if !(rate.requests_per_second.is_finite() && rate.requests_per_second > 0.0) {
        errors.push(ValidationError::new("rate_limit.requests_per_second", "must be a positive number"));
    }
    if rate.burst_size == 0 {
        errors.push(ValidationError::new("rate_limit.burst_size", "must be at least 1"));
    }

    let security = &config.security;
    if HeaderName::try_from(security.origin_header.as_str()).is_err() {
        errors.push(ValidationError::new("security.origin_header", "not a valid header name"));
    }
    if security.origin_value.is_empty() || HeaderValue::from_str(&security.origin_value).is_err() {
        errors.push(ValidationError::new("security.origin_value", "not a valid header value"));
    }
    if HeaderValue::from_str(&security.content_security_policy).is_err() {
        errors.push(ValidationError::new("security.content_security_policy", "not a valid header value"));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    let obs = &config.observability;
    if !matches!(obs.log_format.as_str(), "pretty" | "json") {
        errors.push(ValidationError::new("observability.log_format", "must be \"pretty\" or \"json\""));
    }
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new("observability.metrics_address", "not a socket address"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = AppConfig::default();
        config.token.rotation_interval_secs = 0;
        config.rate_limit.burst_size = 0;
        config.security.origin_header = "bad header".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec!["token.rotation_interval_secs", "rate_limit.burst_size", "security.origin_header"]
        );
    }

    #[test]
    fn test_rejects_short_tokens() {
        let mut config = AppConfig::default();
        config.token.token_bytes = 8;
        assert!(validate_config(&config).is_err());
    }
}
