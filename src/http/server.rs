//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with every route behind its pipeline chain
//! - Wire up ambient layers (request ID, tracing, timeout)
//! - Start token rotation alongside the listener
//! - Serve until the shutdown signal

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::StatusCode,
    routing::{any, get},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{services::ServeDir, timeout::TimeoutLayer, trace::TraceLayer};

use crate::auth::TokenManager;
use crate::config::{AppConfig, TimeoutConfig};
use crate::error::ServerError;
use crate::http::handlers::{authors, issue_token};
use crate::http::pipeline::Pipeline;
use crate::http::request::{make_request_span, propagate_request_id_layer, set_request_id_layer};
use crate::security::SecurityPolicy;
use crate::store::{AuthorStore, MemoryAuthorStore};

/// Token issuing endpoint (public chain).
pub const TOKEN_PATH: &str = "/api/v1/token";
/// Authors endpoint (protected chain).
pub const AUTHORS_PATH: &str = "/api/v1/authors";

/// Attributes of the auth cookie.
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub name: Arc<str>,
    pub path: Arc<str>,
    pub secure: bool,
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub tokens: Arc<TokenManager>,
    pub store: Arc<dyn AuthorStore>,
    pub cookie: CookieSettings,
}

/// HTTP server for the authors API.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
    tokens: Arc<TokenManager>,
}

impl HttpServer {
    /// Create a server backed by an in-memory author store.
    pub fn new(config: AppConfig) -> Result<Self, ServerError> {
        Self::with_store(config, Arc::new(MemoryAuthorStore::new()))
    }

    /// Create a server backed by the given store.
    ///
    /// Generates the first token; fails if the random source is unavailable.
    pub fn with_store(config: AppConfig, store: Arc<dyn AuthorStore>) -> Result<Self, ServerError> {
        let tokens = Arc::new(TokenManager::new(&config.token)?);
        let policy = Arc::new(SecurityPolicy::from_config(&config.security)?);

        let cookie = CookieSettings {
            name: Arc::from(config.token.cookie_name.as_str()),
            path: Arc::from(config.token.cookie_path.as_str()),
            secure: config.token.secure_cookie,
        };
        let pipeline = Pipeline::new(
            tokens.clone(),
            config.rate_limit.clone(),
            policy,
            cookie.name.clone(),
        );

        let state = AppState {
            tokens: tokens.clone(),
            store,
            cookie,
        };

        let router = Self::build_router(&config, state, &pipeline);
        Ok(Self {
            router,
            config,
            tokens,
        })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Token, authors and static routes each get their own rate-limit budget.
    fn build_router(config: &AppConfig, state: AppState, pipeline: &Pipeline) -> Router {
        let token_routes =
            pipeline.public("token", Router::new().route(TOKEN_PATH, get(issue_token)));
        let author_routes =
            pipeline.protected("authors", Router::new().route(AUTHORS_PATH, any(authors)));
        let static_files = pipeline.public(
            "static",
            Router::new().fallback_service(ServeDir::new(&config.static_files.root)),
        );

        Router::new()
            .merge(token_routes)
            .merge(author_routes)
            .merge(static_files)
            .with_state(state)
            .layer(request_timeout_layer(&config.timeouts))
            .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
            .layer(propagate_request_id_layer())
            .layer(set_request_id_layer())
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Token rotation runs for as long as the server does and stops on the
    /// same shutdown signal.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            static_root = %self.config.static_files.root,
            "HTTP server starting"
        );

        let rotation = self.tokens.spawn_rotation(shutdown.resubscribe());

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        if let Err(e) = rotation.await {
            tracing::error!(error = %e, "Token rotation task failed");
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// A clone of the fully layered router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// The token manager backing this server.
    pub fn tokens(&self) -> Arc<TokenManager> {
        self.tokens.clone()
    }
}

/// Requests still running after `request_secs` get a 408.
fn request_timeout_layer(config: &TimeoutConfig) -> TimeoutLayer {
    TimeoutLayer::with_status_code(
        StatusCode::REQUEST_TIMEOUT,
        Duration::from_secs(config.request_secs),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[tokio::test(start_paused = true)]
    async fn test_slow_request_times_out() {
        let app = Router::new()
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "done"
                }),
            )
            .layer(request_timeout_layer(&TimeoutConfig { request_secs: 1 }));

        let response = app
            .oneshot(Request::builder().uri("/slow").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    }

    #[test]
    fn test_bad_marker_header_fails_construction() {
        let mut config = AppConfig::default();
        config.security.origin_header = "bad header".to_string();

        match HttpServer::new(config) {
            Err(ServerError::Policy(e)) => assert_eq!(e.field, "origin_header"),
            Err(other) => panic!("expected policy error, got {:?}", other),
            Ok(_) => panic!("server built with an invalid marker header"),
        }
    }
}
