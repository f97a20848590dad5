//! Authors API gate.
//!
//! A small JSON API behind a browser client, guarded by a request
//! authorization pipeline: security headers, content-security-policy,
//! per-client rate limiting, an origin marker check and a self-rotating
//! cookie token.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;
pub mod store;

pub use auth::TokenManager;
pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
