//! Authors gate server.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client Request
//!   ──────────────▶ request id ─▶ trace ─▶ timeout
//!                                            │
//!            ┌───────────────────────────────┼──────────────────────────┐
//!            ▼                               ▼                          ▼
//!   /api/v1/token (public)        /api/v1/authors (protected)     /* (public)
//!   headers → CSP → rate limit    headers → CSP → rate limit      headers → CSP → rate limit
//!            │                      → origin → token                    │
//!            ▼                               ▼                          ▼
//!   Set-Cookie: AuthToken           AuthorStore (list/create)       static files
//!
//!   Background: TokenManager rotation every `token.rotation_interval_secs`
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use authors_gate::config::validation::validate_config;
use authors_gate::config::{load_or_default, ConfigError};
use authors_gate::lifecycle::{wait_for_shutdown_signal, Shutdown};
use authors_gate::observability::{logging, metrics};
use authors_gate::HttpServer;

#[derive(Parser)]
#[command(name = "authors-gate")]
#[command(about = "Authors API behind a rotating-token authorization pipeline", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "AUTHORS_GATE_CONFIG")]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(long)]
    bind: Option<String>,

    /// Override `static_files.root`.
    #[arg(long)]
    static_dir: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = load_or_default(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }
    if let Some(root) = args.static_dir {
        config.static_files.root = root;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init_logging(&config.observability)?;

    tracing::info!("authors-gate v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        rotation_interval_secs = config.token.rotation_interval_secs,
        requests_per_second = config.rate_limit.requests_per_second,
        burst_size = config.rate_limit.burst_size,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    // The first token is generated here; a missing random source stops startup.
    let server = HttpServer::new(config)?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
