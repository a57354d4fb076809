//! Catalog management service

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::Book,
    repository::BooksRepository,
    services::metadata::MetadataProvider,
};

#[derive(Clone)]
pub struct CatalogService {
    books: Arc<dyn BooksRepository>,
    metadata: Arc<dyn MetadataProvider>,
}

impl CatalogService {
    pub fn new(books: Arc<dyn BooksRepository>, metadata: Arc<dyn MetadataProvider>) -> Self {
        Self { books, metadata }
    }

    /// Add a new ISBN to the catalog, pulling bibliographic data from the
    /// metadata provider. Fields the provider does not supply default to
    /// "Unknown".
    pub async fn add_book(&self, isbn: i64, quantity: i32) -> AppResult<Book> {
        if isbn <= 0 {
            return Err(AppError::Validation("Invalid ISBN format".to_string()));
        }
        if quantity <= 0 {
            return Err(AppError::Validation(
                "Quantity must be a positive integer".to_string(),
            ));
        }

        if self.books.find_by_isbn(isbn).await?.is_some() {
            return Err(AppError::DuplicateIsbn(isbn));
        }

        let metadata = self
            .metadata
            .lookup(isbn)
            .await?
            .ok_or(AppError::MetadataNotFound(isbn))?;

        let book = Book::from_metadata(isbn, quantity, metadata);
        // The unique index is the backstop against a racing add of the
        // same ISBN between the check above and this insert.
        let created = self.books.insert(&book).await?;
        tracing::info!("Added ISBN {} to catalog ({} copies)", isbn, quantity);
        Ok(created)
    }

    /// Remove a book and return the deleted record.
    ///
    /// Deletion is unconditional: outstanding borrow records are not
    /// checked and remain as orphaned history. Known limitation.
    pub async fn remove_book(&self, isbn: i64) -> AppResult<Book> {
        let removed = self
            .books
            .delete(isbn)
            .await?
            .ok_or(AppError::BookNotFound(isbn))?;
        tracing::info!("Removed ISBN {} from catalog", isbn);
        Ok(removed)
    }

    /// Overwrite the on-hand quantity (absolute set, not a delta)
    pub async fn set_quantity(&self, isbn: i64, quantity: i32) -> AppResult<Book> {
        if quantity < 0 {
            return Err(AppError::Validation(
                "Quantity must not be negative".to_string(),
            ));
        }
        self.books
            .set_quantity(isbn, quantity)
            .await?
            .ok_or(AppError::BookNotFound(isbn))
    }

    /// Every book in the catalog; filtering and sorting are presentation
    /// concerns
    pub async fn list_all(&self) -> AppResult<Vec<Book>> {
        self.books.list().await
    }

    pub async fn get_book(&self, isbn: i64) -> AppResult<Book> {
        self.books
            .find_by_isbn(isbn)
            .await?
            .ok_or(AppError::BookNotFound(isbn))
    }

    /// Atomically take one copy for a borrow. Lending service only.
    pub(crate) async fn decrement_on_borrow(&self, isbn: i64) -> AppResult<Book> {
        self.books.decrement_quantity(isbn).await
    }

    /// Put one copy back on return. Lending service only.
    pub(crate) async fn increment_on_return(&self, isbn: i64) -> AppResult<Book> {
        self.books.increment_quantity(isbn).await
    }
}
