//! Repository layer for book storage

pub mod books;

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::Book;

/// Main repository struct holding the book collection.
///
/// Clones share the same collection. Every read-modify-write sequence runs
/// under a single write guard.
#[derive(Clone)]
pub struct Repository {
    books: Arc<RwLock<Vec<Book>>>,
    id_length: usize,
}

impl Repository {
    /// Create an empty repository generating ids of `id_length` characters
    pub fn new(id_length: usize) -> Self {
        Self {
            books: Arc::new(RwLock::new(Vec::new())),
            id_length,
        }
    }
}
