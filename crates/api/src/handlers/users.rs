//! Handlers for the `/users` resource.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use storefront_core::error::CoreError;
use storefront_core::types::DbId;
use storefront_db::models::user::UserResponse;
use storefront_db::repositories::UserRepo;

use crate::auth::jwt::ADMIN_TOKEN_EXPIRY_SECS;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/users/me
pub async fn me(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    profile(&state, auth_user.user_id).await
}

/// GET /api/v1/users/{id}
///
/// A user's profile, visible to that user and to admins.
pub async fn get_by_id(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    auth_user.ensure_owner_or_admin(id)?;
    profile(&state, id).await
}

/// A short-lived admin token.
#[derive(Debug, Serialize)]
pub struct AdminTokenResponse {
    pub token: String,
    /// Lifetime in seconds.
    pub expires_in: i64,
}

/// GET /api/v1/users/admin/secret
///
/// Issue an admin token, required alongside an admin access token to create
/// another admin.
pub async fn admin_secret(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<AdminTokenResponse>>> {
    let token = state
        .config
        .jwt
        .issue_admin_token()
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;
    tracing::info!(user_id = admin.user_id, "Admin token issued");
    Ok(Json(DataResponse::new(AdminTokenResponse {
        token,
        expires_in: ADMIN_TOKEN_EXPIRY_SECS,
    })))
}

async fn profile(state: &AppState, id: DbId) -> AppResult<Json<DataResponse<UserResponse>>> {
    let user = UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound { entity: "User", id })?;
    Ok(Json(DataResponse::new(UserResponse::from(&user))))
}
