//! Application handlers behind the pipeline.

use axum::{
    body::Bytes,
    extract::State,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::OffsetDateTime;

use crate::error::StoreError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::store::NewAuthor;

/// Body returned for methods other than GET and POST on the authors route.
pub const UNSUPPORTED_METHOD: &str = "Sorry, only GET and POST methods are supported.";

/// `GET /api/v1/token`: hand the current token to the client as a cookie.
pub async fn issue_token(State(state): State<AppState>, jar: CookieJar) -> CookieJar {
    let issued = state.tokens.current();
    let settings = &state.cookie;

    let cookie = Cookie::build((settings.name.to_string(), issued.value))
        .path(settings.path.to_string())
        .secure(settings.secure)
        .http_only(true)
        .same_site(SameSite::Strict)
        .expires(OffsetDateTime::from(issued.expires_at))
        .build();

    tracing::debug!("Issued authentication token");
    metrics::record_request("token", StatusCode::OK.as_u16());
    jar.add(cookie)
}

/// `/api/v1/authors`: list on GET, create on POST.
///
/// Other methods get a plain-text notice with a 200 status.
pub async fn authors(State(state): State<AppState>, method: Method, body: Bytes) -> Response {
    let response = match method {
        Method::GET => list_authors(&state),
        Method::POST => create_author(&state, &body),
        _ => (StatusCode::OK, UNSUPPORTED_METHOD).into_response(),
    };

    metrics::record_request("authors", response.status().as_u16());
    response
}

fn list_authors(state: &AppState) -> Response {
    match state.store.list() {
        Ok(authors) => Json(authors).into_response(),
        Err(e) => store_failure(e),
    }
}

fn create_author(state: &AppState, body: &[u8]) -> Response {
    let new_author: NewAuthor = match serde_json::from_slice(body) {
        Ok(author) => author,
        Err(e) => {
            tracing::warn!(error = %e, "Error decoding request body");
            return (
                StatusCode::BAD_REQUEST,
                format!("Error decoding request body: {}", e),
            )
                .into_response();
        }
    };

    match state.store.create(new_author) {
        Ok(author) => {
            tracing::info!(author_id = author.id, "Author created");
            Json(author).into_response()
        }
        Err(e) => store_failure(e),
    }
}

fn store_failure(error: StoreError) -> Response {
    match error {
        StoreError::Rejected(message) => (StatusCode::BAD_REQUEST, message).into_response(),
        StoreError::Poisoned => {
            tracing::error!("Author store lock poisoned");
            (StatusCode::INTERNAL_SERVER_ERROR, "Author store unavailable").into_response()
        }
    }
}
