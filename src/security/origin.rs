//! Origin marker verifier.
//!
//! The client bridge stamps a fixed header on every API call. Requiring it
//! separates bridge traffic from plain browser navigation; it is not a
//! credential.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::response::Rejection;
use crate::security::SecurityPolicy;

/// Reject requests whose marker header is absent or not an exact match.
pub async fn origin_middleware(
    State(policy): State<Arc<SecurityPolicy>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let matches = request
        .headers()
        .get(&policy.origin_header)
        .is_some_and(|value| value.as_bytes() == policy.origin_value.as_bytes());

    if !matches {
        tracing::warn!(path = %request.uri().path(), header = %policy.origin_header, "Invalid request source");
        return Rejection::InvalidSource.into_response();
    }

    next.run(request).await
}
