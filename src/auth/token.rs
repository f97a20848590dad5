//! Self-rotating authentication token.
//!
//! # Responsibilities
//! - Own the single process-wide current token and its expiry
//! - Replace it with a fresh random token on a fixed interval
//! - Hand the current token out and check candidates against it
//!
//! # Design Decisions
//! - One `Mutex` guards the (token, expiry) pair; nothing else sees the raw value
//! - Random bytes are drawn before the lock is taken
//! - Validity is equality with the current token only. The stored expiry is
//!   advisory (it is stamped on the cookie) and is NOT checked here: a token
//!   stays valid until the next rotation supersedes it, however late that is.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::rngs::OsRng;
use rand::RngCore;
use subtle::ConstantTimeEq;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use crate::config::TokenConfig;
use crate::error::TokenError;
use crate::observability::metrics;

/// A token handed to a client, with the instant it is advertised to expire.
#[derive(Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub value: String,
    pub expires_at: SystemTime,
}

impl fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedToken")
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

struct TokenState {
    value: String,
    expires_at: SystemTime,
}

/// Owner of the current authentication token.
pub struct TokenManager {
    state: Mutex<TokenState>,
    rotation_interval: Duration,
    token_bytes: usize,
}

impl TokenManager {
    /// Create a manager from config and generate the first token.
    pub fn new(config: &TokenConfig) -> Result<Self, TokenError> {
        Self::with_interval(
            Duration::from_secs(config.rotation_interval_secs),
            config.token_bytes,
        )
    }

    /// Create a manager with an explicit interval and generate the first token.
    pub fn with_interval(rotation_interval: Duration, token_bytes: usize) -> Result<Self, TokenError> {
        let value = generate_token(token_bytes)?;
        Ok(Self {
            state: Mutex::new(TokenState {
                value,
                expires_at: SystemTime::now() + rotation_interval,
            }),
            rotation_interval,
            token_bytes,
        })
    }

    /// Replace the current token with a freshly generated one.
    ///
    /// Every previously issued token stops validating once this returns.
    pub fn rotate(&self) -> Result<(), TokenError> {
        let value = generate_token(self.token_bytes)?;
        let expires_at = SystemTime::now() + self.rotation_interval;

        let mut state = self.state.lock().expect("token mutex poisoned");
        state.value = value;
        state.expires_at = expires_at;
        Ok(())
    }

    /// The current token and its expiry, for issuing to a client.
    pub fn current(&self) -> IssuedToken {
        let state = self.state.lock().expect("token mutex poisoned");
        IssuedToken {
            value: state.value.clone(),
            expires_at: state.expires_at,
        }
    }

    /// True iff `candidate` is the current token.
    ///
    /// The recorded expiry is deliberately ignored; only rotation invalidates.
    pub fn validate(&self, candidate: &str) -> bool {
        let state = self.state.lock().expect("token mutex poisoned");
        bool::from(state.value.as_bytes().ct_eq(candidate.as_bytes()))
    }

    /// Spawn the background rotation task.
    ///
    /// Rotates once per interval until `shutdown` fires. A failure of the
    /// random source is unrecoverable and terminates the process.
    pub fn spawn_rotation(self: &Arc<Self>, mut shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            let interval = manager.rotation_interval;
            let mut ticker = time::interval_at(Instant::now() + interval, interval);

            tracing::info!(interval_secs = interval.as_secs_f64(), "Token rotation started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match manager.rotate() {
                            Ok(()) => {
                                metrics::record_token_rotation();
                                tracing::debug!("Authentication token rotated");
                            }
                            Err(e) => {
                                tracing::error!(error = %e, "Token rotation failed, terminating");
                                std::process::exit(1);
                            }
                        }
                    }
                    _ = shutdown.recv() => {
                        tracing::info!("Token rotation received shutdown signal, exiting loop");
                        break;
                    }
                }
            }
        })
    }
}

/// Draw `len` bytes from the OS random source and encode them as URL-safe base64.
fn generate_token(len: usize) -> Result<String, TokenError> {
    let mut bytes = vec![0u8; len];
    OsRng.try_fill_bytes(&mut bytes)?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}
