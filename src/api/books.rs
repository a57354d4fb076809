//! Catalog management endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{error::AppResult, models::Book};

use super::AuthenticatedUser;

/// Add book request
#[derive(Deserialize, ToSchema)]
pub struct AddBookRequest {
    /// Numeric ISBN identity key
    pub isbn: i64,
    /// Initial number of copies, must be positive
    pub quantity: i32,
}

/// Quantity update request
#[derive(Deserialize, ToSchema)]
pub struct SetQuantityRequest {
    /// New absolute on-hand quantity
    pub quantity: i32,
}

/// List all books in the catalog
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All catalog entries", body = Vec<Book>)
    )
)]
pub async fn list_books(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.catalog.list_all().await?;
    Ok(Json(books))
}

/// Add a new book to the catalog
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = AddBookRequest,
    responses(
        (status = 201, description = "Book added", body = Book),
        (status = 400, description = "Invalid ISBN or quantity"),
        (status = 404, description = "No metadata for this ISBN"),
        (status = 409, description = "ISBN already in catalog"),
        (status = 502, description = "Metadata provider unavailable")
    )
)]
pub async fn add_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<AddBookRequest>,
) -> AppResult<(StatusCode, Json<Book>)> {
    claims.principal().require_librarian()?;

    let book = state
        .services
        .catalog
        .add_book(request.isbn, request.quantity)
        .await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// Remove a book from the catalog
#[utoipa::path(
    delete,
    path = "/books/{isbn}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("isbn" = i64, Path, description = "Book ISBN")
    ),
    responses(
        (status = 200, description = "Book removed", body = Book),
        (status = 404, description = "Book not found")
    )
)]
pub async fn remove_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(isbn): Path<i64>,
) -> AppResult<Json<Book>> {
    claims.principal().require_librarian()?;

    let removed = state.services.catalog.remove_book(isbn).await?;
    Ok(Json(removed))
}

/// Overwrite a book's on-hand quantity
#[utoipa::path(
    put,
    path = "/books/{isbn}/quantity",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("isbn" = i64, Path, description = "Book ISBN")
    ),
    request_body = SetQuantityRequest,
    responses(
        (status = 200, description = "Quantity updated", body = Book),
        (status = 400, description = "Negative quantity"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn set_quantity(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(isbn): Path<i64>,
    Json(request): Json<SetQuantityRequest>,
) -> AppResult<Json<Book>> {
    claims.principal().require_librarian()?;

    let updated = state
        .services
        .catalog
        .set_quantity(isbn, request.quantity)
        .await?;
    Ok(Json(updated))
}
