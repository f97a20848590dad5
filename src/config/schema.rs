//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gate.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the authors gate.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Authentication token rotation and cookie settings.
    pub token: TokenConfig,

    /// Per-client rate limiting.
    pub rate_limit: RateLimitConfig,

    /// Response headers and the origin marker check.
    pub security: SecurityConfig,

    /// Static file serving for the browser client.
    pub static_files: StaticFilesConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Authentication token configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Seconds between token rotations. Also the lifetime stamped on the cookie.
    pub rotation_interval_secs: u64,

    /// Number of random bytes drawn per token (64 = 512 bits).
    pub token_bytes: usize,

    /// Name of the cookie carrying the token.
    pub cookie_name: String,

    /// Path scope of the cookie; the API namespace only.
    pub cookie_path: String,

    /// Mark the cookie `Secure`. Only disable for plain-HTTP development.
    pub secure_cookie: bool,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            rotation_interval_secs: 30,
            token_bytes: 64,
            cookie_name: "AuthToken".to_string(),
            cookie_path: "/api/v1/".to_string(),
            secure_cookie: true,
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Tokens refilled per second per client.
    pub requests_per_second: f64,

    /// Burst capacity per client.
    pub burst_size: u32,

    /// Maximum number of tracked clients before eviction kicks in (0 = unbounded).
    pub max_tracked_clients: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 5.0,
            burst_size: 10,
            max_tracked_clients: 10_000,
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Value of the `Content-Security-Policy` header.
    pub content_security_policy: String,

    /// Header the client bridge stamps on every API call.
    pub origin_header: String,

    /// Exact value expected in `origin_header`.
    pub origin_value: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            // 'wasm-eval' and 'unsafe-eval' are needed by the WebAssembly client.
            content_security_policy: "default-src 'self'; script-src 'self' 'wasm-eval' 'unsafe-eval'; style-src 'self' 'unsafe-inline';".to_string(),
            origin_header: "X-Requested-By".to_string(),
            origin_value: "WASM_Authors".to_string(),
        }
    }
}

/// Static file serving configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    /// Directory served for every path outside the API.
    pub root: String,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            root: "./static".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format: "pretty" or "json".
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
