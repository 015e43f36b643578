//! Media upload credential endpoints

use axum::{extract::State, Json};

use crate::{error::AppResult, services::uploads::UploadAuth};

use super::AuthenticatedUser;

/// Signed upload credentials for the media service
#[utoipa::path(
    get,
    path = "/uploads/auth",
    tag = "uploads",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Signed upload credentials", body = UploadAuth),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn upload_auth(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<UploadAuth>> {
    let auth = state.services.uploads.upload_auth()?;
    Ok(Json(auth))
}
