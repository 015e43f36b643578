//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, books, borrows, health, stats, uploads, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "BookWise API",
        version = "1.0.0",
        description = "University Library Management REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html"),
        contact(name = "BookWise Team", email = "contact@bookwise.app")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::register,
        auth::login,
        auth::me,
        // Books
        books::list_books,
        books::get_book,
        books::similar_books,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Users
        users::list_users,
        users::account_requests,
        users::update_status,
        users::update_role,
        users::delete_user,
        // Borrows
        borrows::borrow_book,
        borrows::list_borrows,
        borrows::update_status,
        borrows::my_borrows,
        borrows::user_borrows,
        borrows::receipt,
        // Stats
        stats::dashboard,
        // Uploads
        uploads::upload_auth,
    ),
    components(
        schemas(
            // Auth
            auth::LoginResponse,
            // Users
            crate::models::user::User,
            crate::models::user::UserSummary,
            crate::models::user::RegisterUser,
            crate::models::user::LoginRequest,
            crate::models::user::UserQuery,
            crate::models::user::UserSort,
            crate::models::user::UserRole,
            crate::models::user::AccountStatus,
            crate::models::user::UpdateAccountStatus,
            crate::models::user::UpdateUserRole,
            // Books
            crate::models::book::Book,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            crate::models::book::BookQuery,
            crate::models::book::BookSort,
            // Borrows
            crate::models::borrow::BorrowRecord,
            crate::models::borrow::BorrowRecordDetails,
            crate::models::borrow::BorrowedBook,
            crate::models::borrow::Borrower,
            crate::models::borrow::BorrowStatus,
            crate::models::borrow::BorrowSort,
            crate::models::borrow::BorrowQuery,
            crate::models::borrow::CreateBorrow,
            crate::models::borrow::UpdateBorrowStatus,
            crate::models::receipt::BorrowReceipt,
            // Stats
            crate::services::stats::DashboardStats,
            // Uploads
            crate::services::uploads::UploadAuth,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication and registration"),
        (name = "books", description = "Book catalog management"),
        (name = "users", description = "User management and account approval"),
        (name = "borrows", description = "Borrow lifecycle"),
        (name = "stats", description = "Admin dashboard statistics"),
        (name = "uploads", description = "Media upload credentials")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
