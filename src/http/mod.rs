//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, ambient layers)
//!     → request.rs (request ID, trace span)
//!     → pipeline.rs (public or protected chain)
//!     → handlers.rs (token issue, authors)
//!     → response.rs (rejections written by pipeline stages)
//!     → Send to client
//! ```

pub mod handlers;
pub mod pipeline;
pub mod request;
pub mod response;
pub mod server;

pub use pipeline::Pipeline;
pub use request::X_REQUEST_ID;
pub use response::Rejection;
pub use server::{AppState, CookieSettings, HttpServer, AUTHORS_PATH, TOKEN_PATH};
