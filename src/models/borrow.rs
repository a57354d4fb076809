//! Borrow record model and the penalty state machine constants

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Overdue penalty accrued per day, in opaque currency units
pub const PENALTY_RATE_PER_DAY: i64 = 50;

/// Borrow record lifecycle status. `Returned` is terminal; a re-borrow
/// creates a new record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum BorrowStatus {
    Borrowed,
    Returned,
}

impl BorrowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BorrowStatus::Borrowed => "borrowed",
            BorrowStatus::Returned => "returned",
        }
    }
}

impl std::str::FromStr for BorrowStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "borrowed" => Ok(BorrowStatus::Borrowed),
            "returned" => Ok(BorrowStatus::Returned),
            other => Err(format!("unknown borrow status: {}", other)),
        }
    }
}

/// One record per borrow event. A user may hold many historical records
/// for the same ISBN, but at most one with status `Borrowed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BorrowRecord {
    pub id: i64,
    /// Reference to the borrowing user
    pub user_email: String,
    /// Reference to the borrowed book
    pub book_isbn: i64,
    pub borrow_date: DateTime<Utc>,
    /// Borrow date plus one calendar month, clamped to the month's last day
    pub due_date: DateTime<Utc>,
    pub status: BorrowStatus,
    /// Stamped on return, null while borrowed
    pub return_date: Option<DateTime<Utc>>,
    pub penalty_flag: bool,
    /// Accrued overdue penalty in opaque currency units
    pub penalty_amount: i64,
    pub paid: bool,
}

impl BorrowRecord {
    pub fn is_active(&self) -> bool {
        self.status == BorrowStatus::Borrowed
    }

    /// Return is blocked while a penalty is flagged and unpaid
    pub fn penalty_blocks_return(&self) -> bool {
        self.penalty_flag && !self.paid
    }
}
