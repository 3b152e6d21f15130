//! Book domain methods on Repository

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use super::Repository;
use crate::{
    error::{AppError, AppResult},
    models::{Book, BookFields},
};

/// URL-safe alphabet, 64 symbols
const ID_ALPHABET: &[u8] = b"useandom-26T198340PX75pxJACKVERYMINDBUSHWOLF_GQZbfghjklqvwyzrict";

const MAX_ID_ATTEMPTS: usize = 8;

fn generate_id(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

/// `now`, pushed past `previous` when the clock has not moved
fn next_update_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

impl Repository {
    /// Snapshot of all books in insertion order
    pub async fn books_list(&self) -> Vec<Book> {
        self.books.read().await.clone()
    }

    pub async fn books_count(&self) -> usize {
        self.books.read().await.len()
    }

    pub async fn books_get_by_id(&self, id: &str) -> Option<Book> {
        self.books
            .read()
            .await
            .iter()
            .find(|book| book.id == id)
            .cloned()
    }

    /// Append a new book and return its id
    pub async fn books_create(&self, fields: &BookFields) -> AppResult<String> {
        let mut books = self.books.write().await;

        let id = (0..MAX_ID_ATTEMPTS)
            .map(|_| generate_id(self.id_length))
            .find(|candidate| !books.iter().any(|book| &book.id == candidate))
            .ok_or_else(|| AppError::Internal("Could not generate a unique book id".to_string()))?;

        let now = Utc::now();
        books.push(Book {
            id: id.clone(),
            name: fields.name.clone(),
            year: fields.year,
            author: fields.author.clone(),
            summary: fields.summary.clone(),
            publisher: fields.publisher.clone(),
            page_count: fields.page_count,
            read_page: fields.read_page,
            finished: fields.finished(),
            reading: fields.reading,
            inserted_at: now,
            updated_at: now,
        });

        Ok(id)
    }

    /// Replace the mutable fields of a book in place.
    ///
    /// `finished` is only re-derived when `recompute_finished` is set.
    /// Returns `None` when no book has this id.
    pub async fn books_update(
        &self,
        id: &str,
        fields: &BookFields,
        recompute_finished: bool,
    ) -> Option<Book> {
        let mut books = self.books.write().await;
        let book = books.iter_mut().find(|book| book.id == id)?;

        book.name = fields.name.clone();
        book.year = fields.year;
        book.author = fields.author.clone();
        book.summary = fields.summary.clone();
        book.publisher = fields.publisher.clone();
        book.page_count = fields.page_count;
        book.read_page = fields.read_page;
        book.reading = fields.reading;
        if recompute_finished {
            book.finished = fields.finished();
        }
        book.updated_at = next_update_timestamp(book.updated_at);

        Some(book.clone())
    }

    /// Returns true if the book existed and was removed
    pub async fn books_delete(&self, id: &str) -> bool {
        let mut books = self.books.write().await;
        match books.iter().position(|book| book.id == id) {
            Some(index) => {
                books.remove(index);
                true
            }
            None => false,
        }
    }
}
