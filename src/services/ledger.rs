//! Borrow ledger: borrow records and the penalty state machine

use std::sync::Arc;

use chrono::{DateTime, Months, Utc};

use crate::{
    error::{AppError, AppResult},
    models::{BorrowRecord, BorrowStatus, PENALTY_RATE_PER_DAY},
    repository::BorrowsRepository,
};

const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Clone)]
pub struct BorrowLedger {
    borrows: Arc<dyn BorrowsRepository>,
}

impl BorrowLedger {
    pub fn new(borrows: Arc<dyn BorrowsRepository>) -> Self {
        Self { borrows }
    }

    /// Due date is one calendar month after the borrow date, clamped to
    /// the target month's last day (Jan 31 -> Feb 29 in a leap year).
    pub fn due_date_for(borrow_date: DateTime<Utc>) -> AppResult<DateTime<Utc>> {
        borrow_date
            .checked_add_months(Months::new(1))
            .ok_or_else(|| AppError::Validation("Borrow date out of range".to_string()))
    }

    /// Recompute the overdue penalty on a record.
    ///
    /// Pure with respect to its inputs: when the record is `Borrowed` and
    /// past due, sets the flag and the amount (days overdue, rounded up,
    /// times the daily rate) and clears `paid`, so a settled payment does
    /// not survive continued lateness past the next read. Never lowers an
    /// amount already recorded, and leaves current or returned records
    /// untouched. Returns whether the record changed.
    pub fn refresh_penalty(record: &mut BorrowRecord, now: DateTime<Utc>) -> bool {
        if !record.is_active() {
            return false;
        }
        let overdue_seconds = (now - record.due_date).num_seconds();
        if overdue_seconds <= 0 {
            return false;
        }
        let days_overdue = (overdue_seconds + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY;
        let amount = (days_overdue * PENALTY_RATE_PER_DAY).max(record.penalty_amount);
        let changed = !record.penalty_flag || record.penalty_amount != amount || record.paid;
        record.penalty_flag = true;
        record.penalty_amount = amount;
        record.paid = false;
        changed
    }

    pub async fn has_active_borrow(&self, email: &str, isbn: i64) -> AppResult<bool> {
        Ok(self.borrows.find_active(email, isbn).await?.is_some())
    }

    /// The active record for a (user, isbn) pair
    pub async fn active_record(&self, email: &str, isbn: i64) -> AppResult<BorrowRecord> {
        self.borrows
            .find_active(email, isbn)
            .await?
            .ok_or_else(|| AppError::RecordNotFound {
                email: email.to_string(),
                isbn,
            })
    }

    /// Open a new borrow record with penalty fields zeroed
    pub async fn create_borrow_record(
        &self,
        email: &str,
        isbn: i64,
        borrow_date: DateTime<Utc>,
    ) -> AppResult<BorrowRecord> {
        let record = BorrowRecord {
            id: 0,
            user_email: email.to_string(),
            book_isbn: isbn,
            borrow_date,
            due_date: Self::due_date_for(borrow_date)?,
            status: BorrowStatus::Borrowed,
            return_date: None,
            penalty_flag: false,
            penalty_amount: 0,
            paid: false,
        };
        self.borrows.insert(&record).await
    }

    /// Close the active record for the pair. Blocked while a penalty is
    /// flagged and unpaid; this is a hard gate, not a warning.
    pub async fn record_return(&self, email: &str, isbn: i64) -> AppResult<BorrowRecord> {
        let mut record = self.active_record(email, isbn).await?;
        if record.penalty_blocks_return() {
            return Err(AppError::PenaltyUnpaid);
        }
        record.status = BorrowStatus::Returned;
        record.return_date = Some(Utc::now());
        self.borrows.update(&record).await
    }

    /// Settle the penalty on the active record. Only flips `paid`; the
    /// flag and the amount stay visible.
    pub async fn mark_penalty_paid(&self, email: &str, isbn: i64) -> AppResult<BorrowRecord> {
        let mut record = self.active_record(email, isbn).await?;
        if !record.penalty_flag {
            return Err(AppError::RecordNotFound {
                email: email.to_string(),
                isbn,
            });
        }
        record.paid = true;
        self.borrows.update(&record).await
    }

    /// Every record for the user, with penalties refreshed and persisted
    /// first.
    ///
    /// Penalty accrual is lazy: it happens here, on read, not on a
    /// schedule. A user whose inventory is never listed accrues no visible
    /// penalty until the next read.
    pub async fn list_for_user(&self, email: &str) -> AppResult<Vec<BorrowRecord>> {
        let now = Utc::now();
        let mut records = self.borrows.list_for_user(email).await?;
        for record in records.iter_mut() {
            if Self::refresh_penalty(record, now) {
                self.borrows.update(record).await?;
            }
        }
        Ok(records)
    }

    /// All active records across users, for the librarian overview
    pub async fn list_active(&self) -> AppResult<Vec<BorrowRecord>> {
        self.borrows.list_active().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(due: DateTime<Utc>) -> BorrowRecord {
        BorrowRecord {
            id: 1,
            user_email: "reader@example.org".to_string(),
            book_isbn: 111,
            borrow_date: due - chrono::Duration::days(30),
            due_date: due,
            status: BorrowStatus::Borrowed,
            return_date: None,
            penalty_flag: false,
            penalty_amount: 0,
            paid: false,
        }
    }

    #[test]
    fn due_date_clamps_to_short_months() {
        let borrowed = Utc.with_ymd_and_hms(2024, 1, 31, 12, 0, 0).unwrap();
        let due = BorrowLedger::due_date_for(borrowed).unwrap();
        assert_eq!(due, Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap());
    }

    #[test]
    fn due_date_keeps_day_of_month_when_it_fits() {
        let borrowed = Utc.with_ymd_and_hms(2024, 3, 15, 9, 30, 0).unwrap();
        let due = BorrowLedger::due_date_for(borrowed).unwrap();
        assert_eq!(due, Utc.with_ymd_and_hms(2024, 4, 15, 9, 30, 0).unwrap());
    }

    #[test]
    fn ten_days_overdue_accrues_five_hundred() {
        let due = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 2, 11, 0, 0, 0).unwrap();
        let mut rec = record(due);

        assert!(BorrowLedger::refresh_penalty(&mut rec, now));
        assert!(rec.penalty_flag);
        assert_eq!(rec.penalty_amount, 10 * PENALTY_RATE_PER_DAY);
        assert!(!rec.paid);
    }

    #[test]
    fn partial_days_round_up() {
        let due = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 1).unwrap();
        let mut rec = record(due);

        assert!(BorrowLedger::refresh_penalty(&mut rec, now));
        assert_eq!(rec.penalty_amount, PENALTY_RATE_PER_DAY);
    }

    #[test]
    fn refresh_leaves_current_records_alone() {
        let due = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 20, 0, 0, 0).unwrap();
        let mut rec = record(due);

        assert!(!BorrowLedger::refresh_penalty(&mut rec, now));
        assert!(!rec.penalty_flag);
        assert_eq!(rec.penalty_amount, 0);
    }

    #[test]
    fn refresh_leaves_returned_records_alone() {
        let due = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let mut rec = record(due);
        rec.status = BorrowStatus::Returned;

        assert!(!BorrowLedger::refresh_penalty(&mut rec, now));
        assert_eq!(rec.penalty_amount, 0);
    }

    #[test]
    fn refresh_never_lowers_an_accrued_amount() {
        let due = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let mut rec = record(due);
        rec.penalty_flag = true;
        rec.penalty_amount = 1_000;

        // Two days overdue would compute 100; the recorded 1000 wins.
        let now = Utc.with_ymd_and_hms(2024, 2, 3, 0, 0, 0).unwrap();
        assert!(!BorrowLedger::refresh_penalty(&mut rec, now));
        assert_eq!(rec.penalty_amount, 1_000);
    }

    #[test]
    fn overdue_refresh_clears_a_settled_payment() {
        let due = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 2, 11, 0, 0, 0).unwrap();
        let mut rec = record(due);

        assert!(BorrowLedger::refresh_penalty(&mut rec, now));
        rec.paid = true;

        // Still overdue at the same instant, so the payment is re-armed.
        assert!(BorrowLedger::refresh_penalty(&mut rec, now));
        assert!(!rec.paid);
        assert_eq!(rec.penalty_amount, 10 * PENALTY_RATE_PER_DAY);
    }

    #[test]
    fn refresh_is_idempotent_for_a_fixed_now() {
        let due = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 2, 11, 0, 0, 0).unwrap();
        let mut rec = record(due);

        assert!(BorrowLedger::refresh_penalty(&mut rec, now));
        let snapshot = rec.clone();
        assert!(!BorrowLedger::refresh_penalty(&mut rec, now));
        assert_eq!(rec, snapshot);
    }
}
