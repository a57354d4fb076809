//! Data models

pub mod book;
pub mod borrow;
pub mod user;

pub use book::{Book, BookMetadata};
pub use borrow::{BorrowRecord, BorrowStatus, PENALTY_RATE_PER_DAY};
pub use user::{Principal, Role, User, UserClaims};
