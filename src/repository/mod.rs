//! Record-store boundary: persistence ports for the three collections.
//!
//! Ports describe what the lending core expects of its store. Adapters map
//! their failures into the typed `AppError` variants instead of leaking
//! driver errors. Two adapters exist: `postgres` (production) and `memory`
//! (tests and demo deployments).

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{Book, BorrowRecord, User},
};

/// Port for user reads. User creation and credentials belong to the auth
/// boundary; the lending core only resolves identities.
#[async_trait]
pub trait UsersRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;
}

/// Port for catalog persistence.
///
/// `decrement_quantity` must be an atomic conditional update (decrement only
/// while `quantity > 0`, checked and applied as one operation) so concurrent
/// borrowers cannot overdraw the last copy. `increment_quantity` is guarded
/// the same way for consistency.
#[async_trait]
pub trait BooksRepository: Send + Sync {
    async fn find_by_isbn(&self, isbn: i64) -> AppResult<Option<Book>>;
    async fn list(&self) -> AppResult<Vec<Book>>;
    /// Fails with `DuplicateIsbn` when the ISBN already exists
    async fn insert(&self, book: &Book) -> AppResult<Book>;
    /// Returns the removed record, or `None` when the ISBN is unknown
    async fn delete(&self, isbn: i64) -> AppResult<Option<Book>>;
    /// Absolute overwrite of the on-hand counter
    async fn set_quantity(&self, isbn: i64, quantity: i32) -> AppResult<Option<Book>>;
    /// Fails with `BookNotFound` or `OutOfStock`
    async fn decrement_quantity(&self, isbn: i64) -> AppResult<Book>;
    /// Fails with `BookNotFound`
    async fn increment_quantity(&self, isbn: i64) -> AppResult<Book>;
}

/// Port for borrow-record persistence.
///
/// The store enforces at most one `Borrowed` record per (user, isbn) pair;
/// `insert` surfaces a violation as `AlreadyBorrowed`.
#[async_trait]
pub trait BorrowsRepository: Send + Sync {
    async fn find_active(&self, email: &str, isbn: i64) -> AppResult<Option<BorrowRecord>>;
    /// Persist a new record, assigning its id
    async fn insert(&self, record: &BorrowRecord) -> AppResult<BorrowRecord>;
    /// Persist changes to an existing record, matched by id
    async fn update(&self, record: &BorrowRecord) -> AppResult<BorrowRecord>;
    /// Every record for the user, `Borrowed` and `Returned`
    async fn list_for_user(&self, email: &str) -> AppResult<Vec<BorrowRecord>>;
    /// Every active record across all users
    async fn list_active(&self) -> AppResult<Vec<BorrowRecord>>;
}

/// Container bundling the three ports behind one handle
#[derive(Clone)]
pub struct Repository {
    pub users: Arc<dyn UsersRepository>,
    pub books: Arc<dyn BooksRepository>,
    pub borrows: Arc<dyn BorrowsRepository>,
}

impl Repository {
    /// Production repository backed by Postgres
    pub fn postgres(pool: Pool<Postgres>) -> Self {
        Self {
            users: Arc::new(postgres::PgUsersRepository::new(pool.clone())),
            books: Arc::new(postgres::PgBooksRepository::new(pool.clone())),
            borrows: Arc::new(postgres::PgBorrowsRepository::new(pool)),
        }
    }

    /// In-memory repository for tests and demo deployments
    pub fn in_memory() -> (Self, memory::MemoryStore) {
        let store = memory::MemoryStore::default();
        let repository = Self {
            users: Arc::new(store.clone()),
            books: Arc::new(store.clone()),
            borrows: Arc::new(store.clone()),
        };
        (repository, store)
    }
}
