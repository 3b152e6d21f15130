//! Catalog management service

use crate::{
    config::CatalogConfig,
    error::{AppError, AppResult},
    models::{Book, BookFields, BookFilter, BookPayload, BookQuery, BookSummary},
    repository::Repository,
};

/// Write operation a payload is validated for; picks the failure messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteAction {
    Add,
    Update,
}

impl WriteAction {
    fn failure(self) -> &'static str {
        match self {
            WriteAction::Add => "Failed to add book",
            WriteAction::Update => "Failed to update book",
        }
    }
}

/// Check a create/update payload: `name` first, then the page relationship.
pub fn validate_payload(payload: BookPayload, action: WriteAction) -> AppResult<BookFields> {
    let name = payload.name.ok_or_else(|| {
        AppError::Validation(format!("{}. Please provide the book name", action.failure()))
    })?;

    if let (Some(read_page), Some(page_count)) = (payload.read_page, payload.page_count) {
        if read_page > page_count {
            return Err(AppError::Validation(format!(
                "{}. readPage must not be greater than pageCount",
                action.failure()
            )));
        }
    }

    Ok(BookFields {
        name,
        year: payload.year,
        author: payload.author,
        summary: payload.summary,
        publisher: payload.publisher,
        page_count: payload.page_count,
        read_page: payload.read_page,
        reading: payload.reading,
    })
}

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
    recompute_finished_on_update: bool,
}

impl CatalogService {
    pub fn new(repository: Repository, config: &CatalogConfig) -> Self {
        Self {
            repository,
            recompute_finished_on_update: config.recompute_finished_on_update,
        }
    }

    /// Create a book and return its id.
    ///
    /// The new record must be readable back before success is reported.
    pub async fn create_book(&self, payload: BookPayload) -> AppResult<String> {
        let fields = validate_payload(payload, WriteAction::Add)?;
        let id = self.repository.books_create(&fields).await?;

        if self.repository.books_get_by_id(&id).await.is_none() {
            return Err(AppError::Persistence(WriteAction::Add.failure().to_string()));
        }

        tracing::info!("Catalog: created book id={}", id);
        Ok(id)
    }

    /// List books matching the query, projected to id/name/publisher
    pub async fn list_books(&self, query: &BookQuery) -> Vec<BookSummary> {
        let filter = BookFilter::from_query(query);
        tracing::debug!("Catalog: listing books with filter {:?}", filter);

        self.repository
            .books_list()
            .await
            .iter()
            .filter(|book| filter.matches(book))
            .map(BookSummary::from)
            .collect()
    }

    pub async fn get_book(&self, id: &str) -> AppResult<Book> {
        self.repository
            .books_get_by_id(id)
            .await
            .ok_or_else(|| AppError::NotFound("Book not found".to_string()))
    }

    /// Replace every mutable field of a book
    pub async fn update_book(&self, id: &str, payload: BookPayload) -> AppResult<Book> {
        let fields = validate_payload(payload, WriteAction::Update)?;

        let updated = self
            .repository
            .books_update(id, &fields, self.recompute_finished_on_update)
            .await
            .ok_or_else(|| {
                AppError::NotFound(format!("{}. Id not found", WriteAction::Update.failure()))
            })?;

        tracing::info!("Catalog: updated book id={}", id);
        Ok(updated)
    }

    pub async fn delete_book(&self, id: &str) -> AppResult<()> {
        if !self.repository.books_delete(id).await {
            return Err(AppError::NotFound(
                "Failed to delete book. Id not found".to_string(),
            ));
        }

        tracing::info!("Catalog: deleted book id={}", id);
        Ok(())
    }

    /// Number of stored books (for readiness reporting)
    pub async fn count_books(&self) -> usize {
        self.repository.books_count().await
    }
}
