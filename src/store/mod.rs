//! Author records: the data store the API handlers call into.
//!
//! Storage is a collaborator behind [`AuthorStore`]; the gate ships an
//! in-memory implementation that lives as long as the process.

pub mod memory;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

pub use memory::MemoryAuthorStore;

/// A stored author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: i64,
    pub name: String,
    pub bio: String,
}

/// Body of a create request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAuthor {
    pub name: String,
    #[serde(default)]
    pub bio: String,
}

/// Persistence for author records.
pub trait AuthorStore: Send + Sync {
    /// All authors in creation order.
    fn list(&self) -> Result<Vec<Author>, StoreError>;

    /// Store a new author and return it with its assigned id.
    fn create(&self, author: NewAuthor) -> Result<Author, StoreError>;
}
