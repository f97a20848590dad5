//! Error types shared across subsystems.
//!
//! Per-request rejections are not errors: each pipeline stage turns them
//! into a response itself (see `http::response`). The types here cover the
//! failures that escape a stage.

use crate::security::InvalidPolicy;

/// Failure while producing an authentication token.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// The OS random source could not be read. No token can be produced.
    #[error("secure random source unavailable: {0}")]
    RandomSource(#[from] rand::Error),
}

/// Failure reported by the author store collaborator.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("author store lock poisoned")]
    Poisoned,
    #[error("author store rejected record: {0}")]
    Rejected(String),
}

/// Failure while building the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error(transparent)]
    Policy(#[from] InvalidPolicy),
}
