//! Authentication subsystem.
//!
//! # Data Flow
//! ```text
//! startup:     TokenManager::new → first token
//! background:  spawn_rotation → rotate() every interval
//! GET token:   current() → Set-Cookie
//! protected:   middleware.rs reads cookie → validate()
//! ```

pub mod middleware;
pub mod token;

pub use middleware::{token_middleware, TokenGate};
pub use token::{IssuedToken, TokenManager};
