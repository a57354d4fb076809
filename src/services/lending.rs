//! Lending coordinator: cross-entity invariants for borrow and return
//!
//! Borrow and return each touch the book's on-hand counter and a borrow
//! record. Neither effect may be observed without the other, so the
//! quantity side uses atomic conditional updates and the record side is
//! followed by a compensating counter update when it fails.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use validator::ValidateEmail;

use crate::{
    error::{AppError, AppResult},
    models::{Book, BorrowRecord},
    repository::UsersRepository,
    services::{catalog::CatalogService, ledger::BorrowLedger},
};

#[derive(Clone)]
pub struct LendingService {
    users: Arc<dyn UsersRepository>,
    catalog: CatalogService,
    ledger: BorrowLedger,
}

impl LendingService {
    pub fn new(
        users: Arc<dyn UsersRepository>,
        catalog: CatalogService,
        ledger: BorrowLedger,
    ) -> Self {
        Self {
            users,
            catalog,
            ledger,
        }
    }

    async fn require_user(&self, email: &str) -> AppResult<()> {
        if !email.validate_email() {
            return Err(AppError::Validation("Invalid email format".to_string()));
        }
        self.users
            .find_by_email(email)
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::UserNotFound(email.to_string()))
    }

    /// Borrow one copy of an ISBN for a user.
    ///
    /// Takes the copy with an atomic conditional decrement, then opens the
    /// borrow record; when the record cannot be created the decrement is
    /// compensated so no partial state persists.
    pub async fn borrow(
        &self,
        email: &str,
        isbn: i64,
        borrow_date: DateTime<Utc>,
    ) -> AppResult<BorrowRecord> {
        self.require_user(email).await?;
        self.catalog.get_book(isbn).await?;

        if self.ledger.has_active_borrow(email, isbn).await? {
            return Err(AppError::AlreadyBorrowed {
                email: email.to_string(),
                isbn,
            });
        }

        self.catalog.decrement_on_borrow(isbn).await?;

        match self.ledger.create_borrow_record(email, isbn, borrow_date).await {
            Ok(record) => {
                tracing::info!("User {} borrowed ISBN {}", email, isbn);
                Ok(record)
            }
            Err(e) => {
                // Put the copy back; the decrement must not stick without
                // a record.
                if let Err(rollback) = self.catalog.increment_on_return(isbn).await {
                    tracing::error!(
                        "Failed to roll back quantity for ISBN {} after borrow failure: {}",
                        isbn,
                        rollback
                    );
                }
                Err(e)
            }
        }
    }

    /// Return a borrowed copy.
    ///
    /// Gate checks run first (active record exists, penalty settled), then
    /// the quantity is incremented before the record is closed: if closing
    /// fails, the compensating decrement leaves at worst a transiently
    /// overcounted copy rather than a phantom return.
    pub async fn return_book(&self, email: &str, isbn: i64) -> AppResult<(BorrowRecord, Book)> {
        self.require_user(email).await?;
        self.catalog.get_book(isbn).await?;

        let active = self.ledger.active_record(email, isbn).await?;
        if active.penalty_blocks_return() {
            return Err(AppError::PenaltyUnpaid);
        }

        let book = self.catalog.increment_on_return(isbn).await?;

        match self.ledger.record_return(email, isbn).await {
            Ok(record) => {
                tracing::info!("User {} returned ISBN {}", email, isbn);
                Ok((record, book))
            }
            Err(e) => {
                if let Err(rollback) = self.catalog.decrement_on_borrow(isbn).await {
                    tracing::error!(
                        "Failed to roll back quantity for ISBN {} after return failure: {}",
                        isbn,
                        rollback
                    );
                }
                Err(e)
            }
        }
    }

    /// Settle the accrued penalty on an active borrow
    pub async fn pay_penalty(&self, email: &str, isbn: i64) -> AppResult<BorrowRecord> {
        self.ledger.mark_penalty_paid(email, isbn).await
    }

    /// The user's full borrow history, penalties refreshed on read
    pub async fn user_inventory(&self, email: &str) -> AppResult<Vec<BorrowRecord>> {
        self.require_user(email).await?;
        let records = self.ledger.list_for_user(email).await?;
        if records.is_empty() {
            return Err(AppError::EmptyInventory(
                "No books borrowed by the user".to_string(),
            ));
        }
        Ok(records)
    }

    /// Librarian overview of every active borrow
    pub async fn borrowed_list(&self) -> AppResult<Vec<BorrowRecord>> {
        let records = self.ledger.list_active().await?;
        if records.is_empty() {
            return Err(AppError::EmptyInventory(
                "No borrowed books found".to_string(),
            ));
        }
        Ok(records)
    }
}
