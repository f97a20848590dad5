//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;

use authors_gate::config::AppConfig;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, Request, Response};
use axum_extra::extract::cookie::Cookie;
use http_body_util::BodyExt;

pub const MARKER_HEADER: &str = "X-Requested-By";
pub const MARKER_VALUE: &str = "WASM_Authors";

/// Config with a generous rate limit so tests only hit it on purpose.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.rate_limit.burst_size = 1_000;
    config.rate_limit.requests_per_second = 1_000.0;
    config.static_files.root = "/nonexistent-static-root".to_string();
    config
}

/// Build a request as if it arrived from `ip`.
pub fn request_from(ip: &str, method: &str, uri: &str) -> axum::http::request::Builder {
    let addr: SocketAddr = format!("{}:40000", ip).parse().unwrap();
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(extensions) = builder.extensions_mut() {
        extensions.insert(ConnectInfo(addr));
    }
    builder
}

/// A bridge-style API request: marker header plus the given token cookie.
pub fn api_request(method: &str, uri: &str, token: Option<&str>, body: Body) -> Request<Body> {
    let mut builder = request_from("198.51.100.1", method, uri).header(MARKER_HEADER, MARKER_VALUE);
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("AuthToken={}", token));
    }
    builder.body(body).unwrap()
}

/// The auth cookie set by a token response.
pub fn issued_cookie(response: &Response<Body>) -> Cookie<'static> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| Cookie::parse(v.to_str().unwrap().to_string()).ok())
        .find(|c| c.name() == "AuthToken")
        .expect("no AuthToken cookie set")
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
