//! User management endpoints (admin console)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::user::{UpdateAccountStatus, UpdateUserRole, User, UserQuery, UserSummary},
};

use super::{books::PaginatedResponse, AuthenticatedUser};

/// List users with search and pagination
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("query" = Option<String>, Query, description = "Search by name or email"),
        ("sort" = Option<String>, Query, description = "Sort order: newest, oldest, name_asc, name_desc"),
        ("page" = Option<i64>, Query, description = "Page number"),
        ("per_page" = Option<i64>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "List of users", body = PaginatedResponse<UserSummary>),
        (status = 403, description = "Admin privileges required")
    )
)]
pub async fn list_users(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<UserQuery>,
) -> AppResult<Json<PaginatedResponse<UserSummary>>> {
    claims.require_admin()?;

    let (users, total) = state.services.users.search_users(&query).await?;

    Ok(Json(PaginatedResponse {
        items: users,
        total,
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(10),
    }))
}

/// List pending account requests
#[utoipa::path(
    get,
    path = "/users/account-requests",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("query" = Option<String>, Query, description = "Search by name or email"),
        ("sort" = Option<String>, Query, description = "Sort order"),
        ("page" = Option<i64>, Query, description = "Page number"),
        ("per_page" = Option<i64>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "Pending account requests", body = PaginatedResponse<UserSummary>),
        (status = 403, description = "Admin privileges required")
    )
)]
pub async fn account_requests(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<UserQuery>,
) -> AppResult<Json<PaginatedResponse<UserSummary>>> {
    claims.require_admin()?;

    let (users, total) = state.services.users.account_requests(&query).await?;

    Ok(Json(PaginatedResponse {
        items: users,
        total,
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(10),
    }))
}

/// Approve or reject an account request
#[utoipa::path(
    put,
    path = "/users/{id}/status",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    request_body = UpdateAccountStatus,
    responses(
        (status = 200, description = "Account status updated", body = User),
        (status = 400, description = "Status must be APPROVED or REJECTED"),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_status(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateAccountStatus>,
) -> AppResult<Json<User>> {
    claims.require_admin()?;

    let updated = state.services.users.update_status(id, request.status).await?;
    Ok(Json(updated))
}

/// Update a user's role
#[utoipa::path(
    put,
    path = "/users/{id}/role",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    request_body = UpdateUserRole,
    responses(
        (status = 200, description = "Role updated", body = User),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_role(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateUserRole>,
) -> AppResult<Json<User>> {
    claims.require_admin()?;

    let updated = state.services.users.update_role(id, request.role).await?;
    Ok(Json(updated))
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "User ID"),
        ("force" = Option<bool>, Query, description = "Force delete even with outstanding loans")
    ),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "User not found"),
        (status = 409, description = "User has outstanding loans")
    )
)]
pub async fn delete_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Query(params): Query<DeleteUserParams>,
) -> AppResult<StatusCode> {
    claims.require_admin()?;

    state
        .services
        .users
        .delete_user(id, params.force.unwrap_or(false))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct DeleteUserParams {
    pub force: Option<bool>,
}
