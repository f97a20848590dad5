//! Security response headers.
//!
//! # Responsibilities
//! - Disable content-type sniffing
//! - Deny framing
//! - Set the legacy XSS filter hint
//! - Restrict powerful browser features
//!
//! # Design Decisions
//! - Headers are written on the way out, so rejections from inner stages carry them too
//! - Unconditional: this stage never rejects

use axum::{
    body::Body,
    http::{header, HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};

const FEATURE_POLICY: HeaderName = HeaderName::from_static("feature-policy");
const PERMISSIONS_POLICY: HeaderName = HeaderName::from_static("permissions-policy");

/// Fixed header set applied to every response.
pub const SECURITY_HEADERS: [(HeaderName, &str); 5] = [
    (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (header::X_FRAME_OPTIONS, "DENY"),
    (header::X_XSS_PROTECTION, "1; mode=block"),
    (FEATURE_POLICY, "camera 'none'; microphone 'none'; geolocation 'none'"),
    (PERMISSIONS_POLICY, "camera=(), microphone=(), geolocation=()"),
];

/// Security-header injector stage.
pub async fn security_headers_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    for (name, value) in SECURITY_HEADERS {
        headers.insert(name, HeaderValue::from_static(value));
    }

    response
}
