//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, borrows, health};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Libris API",
        version = "0.3.0",
        description = "Library Lending System REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Books
        books::list_books,
        books::add_book,
        books::remove_book,
        books::set_quantity,
        // Borrows
        borrows::borrow,
        borrows::return_book,
        borrows::pay_penalty,
        borrows::user_inventory,
        borrows::borrowed_list,
    ),
    components(
        schemas(
            // Books
            crate::models::Book,
            books::AddBookRequest,
            books::SetQuantityRequest,
            // Borrows
            crate::models::BorrowRecord,
            crate::models::BorrowStatus,
            borrows::BorrowRequest,
            borrows::ReturnRequest,
            borrows::PayPenaltyRequest,
            borrows::ReturnResponse,
            // Users
            crate::models::Role,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Catalog management"),
        (name = "borrows", description = "Borrow and return workflow")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
