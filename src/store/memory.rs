use std::sync::RwLock;

use crate::error::StoreError;
use crate::store::{Author, AuthorStore, NewAuthor};

/// In-memory [`AuthorStore`]. Ids start at 1 and increase by one.
#[derive(Debug, Default)]
pub struct MemoryAuthorStore {
    authors: RwLock<Vec<Author>>,
}

impl MemoryAuthorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuthorStore for MemoryAuthorStore {
    fn list(&self) -> Result<Vec<Author>, StoreError> {
        let authors = self.authors.read().map_err(|_| StoreError::Poisoned)?;
        Ok(authors.clone())
    }

    fn create(&self, author: NewAuthor) -> Result<Author, StoreError> {
        let name = author.name.trim();
        if name.is_empty() {
            return Err(StoreError::Rejected("name must not be empty".to_string()));
        }

        let mut authors = self.authors.write().map_err(|_| StoreError::Poisoned)?;
        let id = authors.last().map_or(1, |last| last.id + 1);
        let created = Author {
            id,
            name: name.to_string(),
            bio: author.bio,
        };
        authors.push(created.clone());
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_store_lists_nothing() {
        let store = MemoryAuthorStore::new();
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_create_assigns_sequential_ids() {
        let store = MemoryAuthorStore::new();
        let first = store
            .create(NewAuthor { name: "Ursula".into(), bio: "Earthsea".into() })
            .unwrap();
        let second = store
            .create(NewAuthor { name: "Iain".into(), bio: String::new() })
            .unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(store.list().unwrap(), vec![first, second]);
    }

    #[test]
    fn test_create_rejects_blank_name() {
        let store = MemoryAuthorStore::new();
        let err = store
            .create(NewAuthor { name: "  ".into(), bio: "x".into() })
            .unwrap_err();
        assert!(matches!(err, StoreError::Rejected(_)));
        assert!(store.list().unwrap().is_empty());
    }
}
