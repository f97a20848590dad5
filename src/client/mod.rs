//! Client bridge for the authors API.
//!
//! Speaks to the server the way the browser bridge does: every call carries
//! the origin marker header, the token cookie is obtained from the token
//! endpoint right before each protected call, and every call is bounded by a
//! fixed deadline. A call that runs past it fails like any other request.

use std::time::Duration;

use axum_extra::extract::cookie::Cookie;
use reqwest::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::http::{AUTHORS_PATH, TOKEN_PATH};
use crate::store::{Author, NewAuthor};

/// Deadline applied to each call.
pub const BRIDGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Marker header and value the server expects from the bridge.
pub const DEFAULT_ORIGIN_HEADER: &str = "X-Requested-By";
pub const DEFAULT_ORIGIN_VALUE: &str = "WASM_Authors";
pub const DEFAULT_COOKIE_NAME: &str = "AuthToken";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport failure, including the per-call deadline expiring.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("expected {expected}, got {actual}: {body}")]
    UnexpectedStatus {
        expected: StatusCode,
        actual: StatusCode,
        body: String,
    },
    #[error("token endpoint did not set the {0} cookie")]
    MissingCookie(String),
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    /// Status of the response, when the server answered.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::UnexpectedStatus { actual, .. } => Some(*actual),
            ClientError::Http(e) => e.status(),
            _ => None,
        }
    }
}

/// Bridge client holding the most recently issued token.
pub struct BridgeClient {
    client: Client,
    base_url: String,
    origin_header: String,
    origin_value: String,
    cookie_name: String,
    token: Option<String>,
}

impl BridgeClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, BRIDGE_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            origin_header: DEFAULT_ORIGIN_HEADER.to_string(),
            origin_value: DEFAULT_ORIGIN_VALUE.to_string(),
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            token: None,
        })
    }

    /// Override the marker header sent on every call.
    pub fn origin(mut self, header: impl Into<String>, value: impl Into<String>) -> Self {
        self.origin_header = header.into();
        self.origin_value = value.into();
        self
    }

    /// The token currently held, if any.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Replace the held token.
    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    /// Call the token endpoint and keep the issued token.
    pub async fn fetch_token(&mut self) -> Result<(), ClientError> {
        let response = self.send(Method::GET, TOKEN_PATH, None, StatusCode::OK).await?;

        let token = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|value| Cookie::parse(value.to_string()).ok())
            .find(|cookie| cookie.name() == self.cookie_name)
            .map(|cookie| cookie.value().to_string())
            .ok_or_else(|| ClientError::MissingCookie(self.cookie_name.clone()))?;

        self.token = Some(token);
        Ok(())
    }

    /// Fetch a fresh token, then list all authors.
    pub async fn list_authors(&mut self) -> Result<Vec<Author>, ClientError> {
        self.fetch_token().await?;
        self.authors().await
    }

    /// List authors with the token already held.
    pub async fn authors(&self) -> Result<Vec<Author>, ClientError> {
        let response = self.send(Method::GET, AUTHORS_PATH, None, StatusCode::OK).await?;
        decode(response).await
    }

    /// Fetch a fresh token, then create an author.
    pub async fn create_author(&mut self, name: &str, bio: &str) -> Result<Author, ClientError> {
        let body = serde_json::to_vec(&NewAuthor {
            name: name.to_string(),
            bio: bio.to_string(),
        })?;

        self.fetch_token().await?;
        let response = self
            .send(Method::POST, AUTHORS_PATH, Some(body), StatusCode::OK)
            .await?;
        decode(response).await
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
        expected: StatusCode,
    ) -> Result<Response, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(method = %method, url = %url, "Bridge request");

        let mut request = self
            .client
            .request(method, &url)
            .header(CONTENT_TYPE, "application/json")
            .header(self.origin_header.as_str(), self.origin_value.as_str());

        if let Some(token) = &self.token {
            request = request.header(COOKIE, format!("{}={}", self.cookie_name, token));
        }
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if status != expected {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::UnexpectedStatus {
                expected,
                actual: status,
                body,
            });
        }

        Ok(response)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}
