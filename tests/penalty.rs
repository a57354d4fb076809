//! Overdue penalty accrual and payment gating

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use libris_server::{
    error::{AppError, AppResult},
    models::{Book, BookMetadata, BorrowStatus, Role, PENALTY_RATE_PER_DAY},
    repository::{memory::MemoryStore, Repository},
    services::{metadata::MetadataProvider, Services},
};

struct StubMetadata;

#[async_trait]
impl MetadataProvider for StubMetadata {
    async fn lookup(&self, _isbn: i64) -> AppResult<Option<BookMetadata>> {
        Ok(Some(BookMetadata::default()))
    }
}

fn setup() -> (Services, MemoryStore) {
    let (repository, store) = Repository::in_memory();
    let services = Services::new(repository, Arc::new(StubMetadata));
    store.seed_user("ana@example.org", "Ana", Role::Patron);
    store.seed_book(Book {
        isbn: 111,
        title: "Hyperion".to_string(),
        author: "Dan Simmons".to_string(),
        publisher: "Doubleday".to_string(),
        year: Some(1989),
        genre: "Science Fiction".to_string(),
        cover_url: None,
        quantity: 1,
    });
    (services, store)
}

/// Borrow ISBN 111 and backdate the record so it is between 9 and 10 days
/// overdue, which rounds up to exactly 10 penalty days.
async fn borrow_ten_days_overdue(services: &Services, store: &MemoryStore) -> i64 {
    let record = services
        .lending
        .borrow("ana@example.org", 111, Utc::now())
        .await
        .unwrap();
    store.backdate_due_date(
        record.id,
        Utc::now() - Duration::days(9) - Duration::hours(12),
    );
    record.id
}

#[tokio::test]
async fn listing_inventory_accrues_the_overdue_penalty() {
    let (services, store) = setup();
    borrow_ten_days_overdue(&services, &store).await;

    let records = services
        .lending
        .user_inventory("ana@example.org")
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    assert!(records[0].penalty_flag);
    assert_eq!(records[0].penalty_amount, 10 * PENALTY_RATE_PER_DAY);
    assert!(!records[0].paid);

    // The refreshed fields were persisted, not just computed for display.
    let stored = services
        .ledger
        .active_record("ana@example.org", 111)
        .await
        .unwrap();
    assert!(stored.penalty_flag);
    assert_eq!(stored.penalty_amount, 10 * PENALTY_RATE_PER_DAY);
}

#[tokio::test]
async fn penalty_accrual_is_lazy() {
    let (services, store) = setup();
    borrow_ten_days_overdue(&services, &store).await;

    // Nothing has read the inventory yet, so nothing has accrued.
    let stored = services
        .ledger
        .active_record("ana@example.org", 111)
        .await
        .unwrap();
    assert!(!stored.penalty_flag);
    assert_eq!(stored.penalty_amount, 0);
}

#[tokio::test]
async fn unpaid_penalty_blocks_return_until_paid() {
    let (services, store) = setup();
    borrow_ten_days_overdue(&services, &store).await;
    services
        .lending
        .user_inventory("ana@example.org")
        .await
        .unwrap();

    let err = services
        .lending
        .return_book("ana@example.org", 111)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::PenaltyUnpaid));

    // The blocked return must not have touched the stock.
    assert_eq!(services.catalog.get_book(111).await.unwrap().quantity, 0);

    let paid = services
        .lending
        .pay_penalty("ana@example.org", 111)
        .await
        .unwrap();
    // Payment flips only the paid bit; flag and amount stay visible.
    assert!(paid.paid);
    assert!(paid.penalty_flag);
    assert_eq!(paid.penalty_amount, 10 * PENALTY_RATE_PER_DAY);

    let (record, book) = services
        .lending
        .return_book("ana@example.org", 111)
        .await
        .unwrap();
    assert_eq!(record.status, BorrowStatus::Returned);
    assert!(record.return_date.is_some());
    assert_eq!(book.quantity, 1);
}

#[tokio::test]
async fn relisting_overdue_inventory_clears_the_payment() {
    let (services, store) = setup();
    borrow_ten_days_overdue(&services, &store).await;
    services
        .lending
        .user_inventory("ana@example.org")
        .await
        .unwrap();
    services
        .lending
        .pay_penalty("ana@example.org", 111)
        .await
        .unwrap();

    // The book is still out and still overdue, so the next read re-arms
    // the penalty and the return is blocked again.
    let records = services
        .lending
        .user_inventory("ana@example.org")
        .await
        .unwrap();
    assert!(records[0].penalty_flag);
    assert!(!records[0].paid);

    let err = services
        .lending
        .return_book("ana@example.org", 111)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::PenaltyUnpaid));
}

#[tokio::test]
async fn paying_without_an_accrued_penalty_is_not_found() {
    let (services, _store) = setup();
    services
        .lending
        .borrow("ana@example.org", 111, Utc::now())
        .await
        .unwrap();

    let err = services
        .lending
        .pay_penalty("ana@example.org", 111)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::RecordNotFound { .. }));
}

#[tokio::test]
async fn on_time_return_needs_no_payment() {
    let (services, _store) = setup();
    services
        .lending
        .borrow("ana@example.org", 111, Utc::now())
        .await
        .unwrap();

    services
        .lending
        .user_inventory("ana@example.org")
        .await
        .unwrap();
    let (record, _) = services
        .lending
        .return_book("ana@example.org", 111)
        .await
        .unwrap();
    assert!(!record.penalty_flag);
    assert_eq!(record.penalty_amount, 0);
}

#[tokio::test]
async fn returned_records_stop_accruing() {
    let (services, store) = setup();
    let id = borrow_ten_days_overdue(&services, &store).await;
    services
        .lending
        .user_inventory("ana@example.org")
        .await
        .unwrap();
    services
        .lending
        .pay_penalty("ana@example.org", 111)
        .await
        .unwrap();
    services
        .lending
        .return_book("ana@example.org", 111)
        .await
        .unwrap();

    let records = services
        .lending
        .user_inventory("ana@example.org")
        .await
        .unwrap();
    let closed = records.iter().find(|r| r.id == id).unwrap();
    assert_eq!(closed.status, BorrowStatus::Returned);
    // Amount frozen at the value accrued before the return.
    assert_eq!(closed.penalty_amount, 10 * PENALTY_RATE_PER_DAY);
    assert!(closed.paid);
}
