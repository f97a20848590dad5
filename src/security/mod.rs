//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → headers.rs (security headers on the response)
//!     → csp.rs (Content-Security-Policy on the response)
//!     → rate_limit.rs (per-client token bucket)
//!     → origin.rs (bridge marker header, protected routes only)
//!     → auth::middleware (token cookie, protected routes only)
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any security check failure
//! - Each stage handles its own rejection; nothing propagates inward

pub mod csp;
pub mod headers;
pub mod origin;
pub mod rate_limit;

use axum::http::{HeaderName, HeaderValue};

use crate::config::SecurityConfig;

pub use csp::csp_middleware;
pub use headers::security_headers_middleware;
pub use origin::origin_middleware;
pub use rate_limit::{rate_limit_middleware, ClientLimiter, RateLimiterRegistry};

/// Parsed header policy shared by the CSP injector and the origin verifier.
#[derive(Debug, Clone)]
pub struct SecurityPolicy {
    pub content_security_policy: HeaderValue,
    pub origin_header: HeaderName,
    pub origin_value: HeaderValue,
}

/// A config value that is not a usable header.
#[derive(Debug, thiserror::Error)]
#[error("invalid header in security config: {field}")]
pub struct InvalidPolicy {
    pub field: &'static str,
}

impl SecurityPolicy {
    pub fn from_config(config: &SecurityConfig) -> Result<Self, InvalidPolicy> {
        Ok(Self {
            content_security_policy: HeaderValue::from_str(&config.content_security_policy)
                .map_err(|_| InvalidPolicy { field: "content_security_policy" })?,
            origin_header: HeaderName::try_from(config.origin_header.as_str())
                .map_err(|_| InvalidPolicy { field: "origin_header" })?,
            origin_value: HeaderValue::from_str(&config.origin_value)
                .map_err(|_| InvalidPolicy { field: "origin_value" })?,
        })
    }
}
