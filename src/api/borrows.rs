//! Borrow lifecycle endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        borrow::{BorrowQuery, BorrowRecord, BorrowRecordDetails, CreateBorrow, UpdateBorrowStatus},
        receipt::BorrowReceipt,
    },
};

use super::{books::PaginatedResponse, AuthenticatedUser};

/// Borrow a book for the authenticated user
#[utoipa::path(
    post,
    path = "/borrows",
    tag = "borrows",
    security(("bearer_auth" = [])),
    request_body = CreateBorrow,
    responses(
        (status = 201, description = "Book borrowed", body = BorrowRecord),
        (status = 403, description = "Account not approved for borrowing"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "No copies available or already borrowed")
    )
)]
pub async fn borrow_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateBorrow>,
) -> AppResult<(StatusCode, Json<BorrowRecord>)> {
    let record = state
        .services
        .borrows
        .borrow_book(claims.user_id, request.book_id)
        .await?;

    Ok((StatusCode::CREATED, Json(record)))
}

/// List borrow records with joined details (admin)
#[utoipa::path(
    get,
    path = "/borrows",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(
        ("query" = Option<String>, Query, description = "Search over book title, borrower name and email"),
        ("sort" = Option<String>, Query, description = "Sort order: newest, oldest"),
        ("page" = Option<i64>, Query, description = "Page number"),
        ("per_page" = Option<i64>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "Borrow records", body = PaginatedResponse<BorrowRecordDetails>),
        (status = 403, description = "Admin privileges required")
    )
)]
pub async fn list_borrows(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<BorrowQuery>,
) -> AppResult<Json<PaginatedResponse<BorrowRecordDetails>>> {
    claims.require_admin()?;

    let (records, total) = state.services.borrows.search_records(&query).await?;

    Ok(Json(PaginatedResponse {
        items: records,
        total,
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(10),
    }))
}

/// Transition a borrow record between BORROWED and RETURNED (admin)
#[utoipa::path(
    put,
    path = "/borrows/{id}/status",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Borrow record ID")
    ),
    request_body = UpdateBorrowStatus,
    responses(
        (status = 200, description = "Status updated (no-op when unchanged)", body = BorrowRecord),
        (status = 404, description = "Record not found"),
        (status = 409, description = "Copy count would leave the valid range")
    )
)]
pub async fn update_status(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateBorrowStatus>,
) -> AppResult<Json<BorrowRecord>> {
    claims.require_admin()?;

    let record = state.services.borrows.update_status(id, request.status).await?;
    Ok(Json(record))
}

/// Borrow records of the authenticated user
#[utoipa::path(
    get,
    path = "/me/borrows",
    tag = "borrows",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Own borrow records", body = Vec<BorrowRecordDetails>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn my_borrows(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<BorrowRecordDetails>>> {
    let records = state.services.borrows.user_records(claims.user_id).await?;
    Ok(Json(records))
}

/// Borrow records of a specific user (admin)
#[utoipa::path(
    get,
    path = "/users/{id}/borrows",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User's borrow records", body = Vec<BorrowRecordDetails>),
        (status = 404, description = "User not found")
    )
)]
pub async fn user_borrows(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<Vec<BorrowRecordDetails>>> {
    claims.require_admin()?;

    let records = state.services.borrows.user_records(user_id).await?;
    Ok(Json(records))
}

/// Borrow receipt for a record (owner or admin)
#[utoipa::path(
    get,
    path = "/borrows/{id}/receipt",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Borrow record ID")
    ),
    responses(
        (status = 200, description = "Receipt data", body = BorrowReceipt),
        (status = 403, description = "Not the record owner"),
        (status = 404, description = "Record not found")
    )
)]
pub async fn receipt(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BorrowReceipt>> {
    let record = state.services.borrows.get_record(id).await?;

    if !claims.is_admin() && record.user_id != claims.user_id {
        return Err(AppError::Authorization(
            "Receipts are only available to the record owner".to_string(),
        ));
    }

    let receipt = state.services.borrows.receipt_for(&record).await?;
    Ok(Json(receipt))
}
