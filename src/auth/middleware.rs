//! Token verifier stage of the protected chain.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::auth::token::TokenManager;
use crate::http::response::Rejection;

/// State for the token verifier: where to read the token and what to check it against.
#[derive(Clone)]
pub struct TokenGate {
    pub tokens: Arc<TokenManager>,
    pub cookie_name: Arc<str>,
}

impl TokenGate {
    pub fn new(tokens: Arc<TokenManager>, cookie_name: impl Into<Arc<str>>) -> Self {
        Self {
            tokens,
            cookie_name: cookie_name.into(),
        }
    }
}

/// Require the auth cookie and a current token in it.
pub async fn token_middleware(
    State(gate): State<TokenGate>,
    jar: CookieJar,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(cookie) = jar.get(&gate.cookie_name) else {
        tracing::warn!(path = %request.uri().path(), "Authentication required");
        return Rejection::MissingToken.into_response();
    };

    if !gate.tokens.validate(cookie.value()) {
        tracing::warn!(path = %request.uri().path(), "Invalid token");
        return Rejection::InvalidToken.into_response();
    }

    next.run(request).await
}
