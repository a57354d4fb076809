//! Error types for the Libris server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application error codes exposed to API clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Success = 0,
    Failure = 1,
    NotAuthorized = 2,
    DbFailure = 3,
    NoSuchUser = 4,
    NoSuchBook = 5,
    NoSuchRecord = 6,
    DuplicateIsbn = 7,
    AlreadyBorrowed = 8,
    OutOfStock = 9,
    PenaltyUnpaid = 10,
    MetadataNotFound = 11,
    MetadataUnavailable = 12,
    BadValue = 13,
    EmptyInventory = 14,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("User {0} not found")]
    UserNotFound(String),

    #[error("Book with ISBN {0} not found")]
    BookNotFound(i64),

    #[error("No active borrow record for user {email} and ISBN {isbn}")]
    RecordNotFound { email: String, isbn: i64 },

    #[error("Book with ISBN {0} already exists")]
    DuplicateIsbn(i64),

    #[error("User {email} already has ISBN {isbn} borrowed")]
    AlreadyBorrowed { email: String, isbn: i64 },

    #[error("No copies of ISBN {0} available")]
    OutOfStock(i64),

    #[error("Penalty must be paid before returning the book")]
    PenaltyUnpaid,

    #[error("No metadata found for ISBN {0}")]
    MetadataNotFound(i64),

    #[error("Metadata provider unavailable: {0}")]
    MetadataUnavailable(String),

    #[error("{0}")]
    EmptyInventory(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl AppError {
    /// API error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Authentication(_) | AppError::Authorization(_) => ErrorCode::NotAuthorized,
            AppError::Validation(_) => ErrorCode::BadValue,
            AppError::UserNotFound(_) => ErrorCode::NoSuchUser,
            AppError::BookNotFound(_) => ErrorCode::NoSuchBook,
            AppError::RecordNotFound { .. } => ErrorCode::NoSuchRecord,
            AppError::DuplicateIsbn(_) => ErrorCode::DuplicateIsbn,
            AppError::AlreadyBorrowed { .. } => ErrorCode::AlreadyBorrowed,
            AppError::OutOfStock(_) => ErrorCode::OutOfStock,
            AppError::PenaltyUnpaid => ErrorCode::PenaltyUnpaid,
            AppError::MetadataNotFound(_) => ErrorCode::MetadataNotFound,
            AppError::MetadataUnavailable(_) => ErrorCode::MetadataUnavailable,
            AppError::EmptyInventory(_) => ErrorCode::EmptyInventory,
            AppError::Database(_) => ErrorCode::DbFailure,
            AppError::Internal(_) => ErrorCode::Failure,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();
        let (status, message) = match &self {
            AppError::Authentication(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::Authorization(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::UserNotFound(_)
            | AppError::BookNotFound(_)
            | AppError::RecordNotFound { .. }
            | AppError::MetadataNotFound(_)
            | AppError::EmptyInventory(_) => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::DuplicateIsbn(_) | AppError::AlreadyBorrowed { .. } => {
                (StatusCode::CONFLICT, self.to_string())
            }
            AppError::OutOfStock(_) | AppError::PenaltyUnpaid => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            AppError::MetadataUnavailable(_) => (StatusCode::BAD_GATEWAY, self.to_string()),
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
