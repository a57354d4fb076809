//! In-memory adapter for the record-store ports.
//!
//! Backs the integration tests and small demo deployments. Every operation
//! takes the state lock for its whole check-and-mutate sequence, which gives
//! the same conditional-update atomicity the Postgres adapter gets from
//! single-statement updates and the partial unique index.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use crate::{
    error::{AppError, AppResult},
    models::{Book, BorrowRecord, User},
    repository::{BooksRepository, BorrowsRepository, UsersRepository},
};

#[derive(Default)]
struct State {
    users: HashMap<String, User>,
    books: BTreeMap<i64, Book>,
    borrows: Vec<BorrowRecord>,
    next_borrow_id: i64,
}

/// Shared in-memory store implementing all three ports
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed a user account, standing in for the auth boundary
    pub fn seed_user(&self, email: &str, name: &str, role: crate::models::Role) {
        let mut state = self.lock();
        state.users.insert(
            email.to_lowercase(),
            User {
                email: email.to_string(),
                name: name.to_string(),
                password_hash: String::new(),
                role,
            },
        );
    }

    /// Seed a catalog entry directly, bypassing the metadata provider
    pub fn seed_book(&self, book: Book) {
        let mut state = self.lock();
        state.books.insert(book.isbn, book);
    }

    /// Overwrite a record's due date, for exercising overdue paths
    pub fn backdate_due_date(&self, record_id: i64, due_date: chrono::DateTime<Utc>) {
        let mut state = self.lock();
        if let Some(record) = state.borrows.iter_mut().find(|r| r.id == record_id) {
            record.due_date = due_date;
        }
    }
}

#[async_trait]
impl UsersRepository for MemoryStore {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let state = self.lock();
        Ok(state.users.get(&email.to_lowercase()).cloned())
    }
}

#[async_trait]
impl BooksRepository for MemoryStore {
    async fn find_by_isbn(&self, isbn: i64) -> AppResult<Option<Book>> {
        let state = self.lock();
        Ok(state.books.get(&isbn).cloned())
    }

    async fn list(&self) -> AppResult<Vec<Book>> {
        let state = self.lock();
        Ok(state.books.values().cloned().collect())
    }

    async fn insert(&self, book: &Book) -> AppResult<Book> {
        let mut state = self.lock();
        if state.books.contains_key(&book.isbn) {
            return Err(AppError::DuplicateIsbn(book.isbn));
        }
        state.books.insert(book.isbn, book.clone());
        Ok(book.clone())
    }

    async fn delete(&self, isbn: i64) -> AppResult<Option<Book>> {
        let mut state = self.lock();
        Ok(state.books.remove(&isbn))
    }

    async fn set_quantity(&self, isbn: i64, quantity: i32) -> AppResult<Option<Book>> {
        let mut state = self.lock();
        Ok(state.books.get_mut(&isbn).map(|book| {
            book.quantity = quantity;
            book.clone()
        }))
    }

    async fn decrement_quantity(&self, isbn: i64) -> AppResult<Book> {
        let mut state = self.lock();
        let book = state
            .books
            .get_mut(&isbn)
            .ok_or(AppError::BookNotFound(isbn))?;
        if book.quantity == 0 {
            return Err(AppError::OutOfStock(isbn));
        }
        book.quantity -= 1;
        Ok(book.clone())
    }

    async fn increment_quantity(&self, isbn: i64) -> AppResult<Book> {
        let mut state = self.lock();
        let book = state
            .books
            .get_mut(&isbn)
            .ok_or(AppError::BookNotFound(isbn))?;
        book.quantity += 1;
        Ok(book.clone())
    }
}

#[async_trait]
impl BorrowsRepository for MemoryStore {
    async fn find_active(&self, email: &str, isbn: i64) -> AppResult<Option<BorrowRecord>> {
        let state = self.lock();
        Ok(state
            .borrows
            .iter()
            .find(|r| {
                r.is_active() && r.book_isbn == isbn && r.user_email.eq_ignore_ascii_case(email)
            })
            .cloned())
    }

    async fn insert(&self, record: &BorrowRecord) -> AppResult<BorrowRecord> {
        let mut state = self.lock();
        // One active record per (user, isbn), checked under the same lock
        // that performs the insert.
        let duplicate = state.borrows.iter().any(|r| {
            r.is_active()
                && r.book_isbn == record.book_isbn
                && r.user_email.eq_ignore_ascii_case(&record.user_email)
        });
        if duplicate && record.is_active() {
            return Err(AppError::AlreadyBorrowed {
                email: record.user_email.clone(),
                isbn: record.book_isbn,
            });
        }
        state.next_borrow_id += 1;
        let mut stored = record.clone();
        stored.id = state.next_borrow_id;
        state.borrows.push(stored.clone());
        Ok(stored)
    }

    async fn update(&self, record: &BorrowRecord) -> AppResult<BorrowRecord> {
        let mut state = self.lock();
        let slot = state
            .borrows
            .iter_mut()
            .find(|r| r.id == record.id)
            .ok_or_else(|| AppError::RecordNotFound {
                email: record.user_email.clone(),
                isbn: record.book_isbn,
            })?;
        *slot = record.clone();
        Ok(record.clone())
    }

    async fn list_for_user(&self, email: &str) -> AppResult<Vec<BorrowRecord>> {
        let state = self.lock();
        Ok(state
            .borrows
            .iter()
            .filter(|r| r.user_email.eq_ignore_ascii_case(email))
            .cloned()
            .collect())
    }

    async fn list_active(&self) -> AppResult<Vec<BorrowRecord>> {
        let state = self.lock();
        Ok(state
            .borrows
            .iter()
            .filter(|r| r.is_active())
            .cloned()
            .collect())
    }
}
