//! Rejection responses written by pipeline stages.
//!
//! # Design Decisions
//! - One enum names every way a request can be stopped before the handler
//! - Status codes are fixed: 429 rate limit, 403 source, 401 token
//! - Bodies are short plain text; clients branch on status only

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::observability::metrics;

/// Why a pipeline stage stopped a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The client's token bucket is empty.
    RateLimited,
    /// The origin marker header is missing or wrong.
    InvalidSource,
    /// No auth cookie on the request.
    MissingToken,
    /// The auth cookie does not hold the current token.
    InvalidToken,
}

impl Rejection {
    pub fn status(self) -> StatusCode {
        match self {
            Rejection::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Rejection::InvalidSource => StatusCode::FORBIDDEN,
            Rejection::MissingToken | Rejection::InvalidToken => StatusCode::UNAUTHORIZED,
        }
    }

    /// Metric label.
    pub fn reason(self) -> &'static str {
        match self {
            Rejection::RateLimited => "rate_limited",
            Rejection::InvalidSource => "invalid_source",
            Rejection::MissingToken => "missing_token",
            Rejection::InvalidToken => "invalid_token",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Rejection::RateLimited => "Too Many Requests",
            Rejection::InvalidSource => "Invalid request source",
            Rejection::MissingToken => "Authentication required",
            Rejection::InvalidToken => "Invalid token",
        }
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        metrics::record_rejection(self.reason());
        (self.status(), self.message()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_statuses() {
        assert_eq!(Rejection::RateLimited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(Rejection::InvalidSource.status(), StatusCode::FORBIDDEN);
        assert_eq!(Rejection::MissingToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(Rejection::InvalidToken.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_rate_limit_body_is_reason_phrase() {
        assert_eq!(
            Some(Rejection::RateLimited.message()),
            StatusCode::TOO_MANY_REQUESTS.canonical_reason()
        );
    }
}
