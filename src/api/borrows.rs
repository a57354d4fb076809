//! Borrow and return endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::{Book, BorrowRecord, Principal, Role},
};

use super::AuthenticatedUser;

/// Borrow request
#[derive(Deserialize, ToSchema)]
pub struct BorrowRequest {
    /// Borrowing user's email
    pub user_email: String,
    /// Book ISBN
    pub book_isbn: i64,
    /// Borrow date; defaults to now
    pub borrow_date: Option<DateTime<Utc>>,
}

/// Return request
#[derive(Deserialize, ToSchema)]
pub struct ReturnRequest {
    pub user_email: String,
    pub book_isbn: i64,
}

/// Penalty payment request
#[derive(Deserialize, ToSchema)]
pub struct PayPenaltyRequest {
    pub user_email: String,
    pub book_isbn: i64,
}

/// Return response with the closed record and updated stock
#[derive(Serialize, ToSchema)]
pub struct ReturnResponse {
    pub record: BorrowRecord,
    pub book: Book,
}

/// Patrons may only act on their own account; librarians and admins may
/// act on behalf of any user.
fn require_self_or_librarian(principal: &Principal, user_email: &str) -> AppResult<()> {
    if principal.role == Role::Patron && !principal.email.eq_ignore_ascii_case(user_email) {
        return Err(AppError::Authorization(
            "Patrons may only manage their own borrows".to_string(),
        ));
    }
    Ok(())
}

/// Borrow a book
#[utoipa::path(
    post,
    path = "/borrows",
    tag = "borrows",
    security(("bearer_auth" = [])),
    request_body = BorrowRequest,
    responses(
        (status = 201, description = "Book borrowed", body = BorrowRecord),
        (status = 400, description = "Invalid request or no copies available"),
        (status = 404, description = "User or book not found"),
        (status = 409, description = "User already has this book borrowed")
    )
)]
pub async fn borrow(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<BorrowRequest>,
) -> AppResult<(StatusCode, Json<BorrowRecord>)> {
    require_self_or_librarian(&claims.principal(), &request.user_email)?;

    let borrow_date = request.borrow_date.unwrap_or_else(Utc::now);
    let record = state
        .services
        .lending
        .borrow(&request.user_email, request.book_isbn, borrow_date)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/borrows/return",
    tag = "borrows",
    security(("bearer_auth" = [])),
    request_body = ReturnRequest,
    responses(
        (status = 200, description = "Book returned", body = ReturnResponse),
        (status = 400, description = "Unpaid penalty blocks the return"),
        (status = 404, description = "User, book or active borrow not found")
    )
)]
pub async fn return_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<ReturnRequest>,
) -> AppResult<Json<ReturnResponse>> {
    require_self_or_librarian(&claims.principal(), &request.user_email)?;

    let (record, book) = state
        .services
        .lending
        .return_book(&request.user_email, request.book_isbn)
        .await?;
    Ok(Json(ReturnResponse { record, book }))
}

/// Pay the penalty on an active borrow
#[utoipa::path(
    post,
    path = "/borrows/penalty/pay",
    tag = "borrows",
    security(("bearer_auth" = [])),
    request_body = PayPenaltyRequest,
    responses(
        (status = 200, description = "Penalty settled", body = BorrowRecord),
        (status = 404, description = "No penalised active borrow for the pair")
    )
)]
pub async fn pay_penalty(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<PayPenaltyRequest>,
) -> AppResult<Json<BorrowRecord>> {
    require_self_or_librarian(&claims.principal(), &request.user_email)?;

    let record = state
        .services
        .lending
        .pay_penalty(&request.user_email, request.book_isbn)
        .await?;
    Ok(Json(record))
}

/// A user's borrow history, penalties refreshed on read
#[utoipa::path(
    get,
    path = "/users/{email}/inventory",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(
        ("email" = String, Path, description = "User email")
    ),
    responses(
        (status = 200, description = "Borrow records", body = Vec<BorrowRecord>),
        (status = 404, description = "User not found or no records")
    )
)]
pub async fn user_inventory(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(email): Path<String>,
) -> AppResult<Json<Vec<BorrowRecord>>> {
    require_self_or_librarian(&claims.principal(), &email)?;

    let records = state.services.lending.user_inventory(&email).await?;
    Ok(Json(records))
}

/// All active borrows, for the librarian dashboard
#[utoipa::path(
    get,
    path = "/borrows/active",
    tag = "borrows",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Active borrow records", body = Vec<BorrowRecord>),
        (status = 404, description = "No borrowed books found")
    )
)]
pub async fn borrowed_list(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<BorrowRecord>>> {
    claims.principal().require_librarian()?;

    let records = state.services.lending.borrowed_list().await?;
    Ok(Json(records))
}
