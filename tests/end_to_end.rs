//! End-to-end tests: a live server on a loopback port driven by the bridge client.

use std::time::Duration;

use authors_gate::client::{BridgeClient, ClientError};
use authors_gate::http::HttpServer;
use authors_gate::lifecycle::Shutdown;
use authors_gate::TokenManager;
use reqwest::StatusCode;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

mod common;

struct TestServer {
    url: String,
    tokens: Arc<TokenManager>,
    shutdown: Shutdown,
    handle: JoinHandle<Result<(), std::io::Error>>,
}

impl TestServer {
    async fn stop(self) {
        self.shutdown.trigger();
        self.handle.await.unwrap().unwrap();
    }
}

async fn start_server(rotation_interval_secs: u64) -> TestServer {
    let mut config = common::test_config();
    config.token.rotation_interval_secs = rotation_interval_secs;

    let server = HttpServer::new(config).unwrap();
    let tokens = server.tokens();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());

    let shutdown = Shutdown::new();
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    TestServer {
        url,
        tokens,
        shutdown,
        handle,
    }
}

#[tokio::test]
async fn test_bridge_create_and_list() {
    let server = start_server(30).await;
    let mut client = BridgeClient::new(&server.url).unwrap();

    assert!(client.list_authors().await.unwrap().is_empty());
    assert!(client.token().is_some());

    let created = client.create_author("Octavia Butler", "Kindred").await.unwrap();
    assert_eq!(created.id, 1);
    assert_eq!(created.bio, "Kindred");

    let authors = client.list_authors().await.unwrap();
    assert_eq!(authors, vec![created]);

    server.stop().await;
}

#[tokio::test]
async fn test_bridge_token_rejected_after_rotation() {
    let server = start_server(30).await;
    let mut client = BridgeClient::new(&server.url).unwrap();
    client.fetch_token().await.unwrap();
    assert!(client.authors().await.is_ok());

    server.tokens.rotate().unwrap();

    let err = client.authors().await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));

    // Refetching recovers
    assert!(client.list_authors().await.is_ok());

    server.stop().await;
}

#[tokio::test]
async fn test_background_rotation_invalidates_held_token() {
    let server = start_server(1).await;
    let mut client = BridgeClient::new(&server.url).unwrap();
    client.fetch_token().await.unwrap();

    tokio::time::sleep(Duration::from_millis(1_500)).await;

    match client.authors().await {
        Err(ClientError::UnexpectedStatus { actual, body, .. }) => {
            assert_eq!(actual, StatusCode::UNAUTHORIZED);
            assert_eq!(body, "Invalid token");
        }
        other => panic!("expected 401, got {:?}", other),
    }

    server.stop().await;
}

#[tokio::test]
async fn test_bridge_without_marker_is_forbidden() {
    let server = start_server(30).await;
    let mut client = BridgeClient::new(&server.url)
        .unwrap()
        .origin("X-Requested-By", "curl");

    // The token endpoint is public, so only the protected call fails
    let err = client.list_authors().await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::FORBIDDEN));

    server.stop().await;
}

#[tokio::test]
async fn test_bridge_call_times_out() {
    // Connections queue in the backlog and never get an answer
    let silent = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", silent.local_addr().unwrap());

    let mut client = BridgeClient::with_timeout(&url, Duration::from_millis(200)).unwrap();
    match client.fetch_token().await {
        Err(ClientError::Http(e)) => assert!(e.is_timeout()),
        other => panic!("expected timeout, got {:?}", other),
    }

    drop(silent);
}
