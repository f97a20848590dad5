//! Content-Security-Policy injector stage.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::Response,
};

use crate::security::SecurityPolicy;

/// Set the configured Content-Security-Policy on every response. Never rejects.
pub async fn csp_middleware(
    State(policy): State<Arc<SecurityPolicy>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(header::CONTENT_SECURITY_POLICY, policy.content_security_policy.clone());
    response
}
