//! Handlers for the `/appinfo` resource.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ApiKeyResponse {
    pub api_key: String,
    /// Lifetime in seconds.
    pub expires_in: i64,
}

/// GET /api/v1/appinfo/apikey
///
/// Issue an API key for the public and sign-in routes. Any signed-in user may
/// ask for one.
pub async fn api_key(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<ApiKeyResponse>>> {
    let jwt = &state.config.jwt;
    let api_key = jwt
        .issue_api_key()
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;
    tracing::info!(user_id = auth_user.user_id, "API key issued");
    Ok(Json(DataResponse::new(ApiKeyResponse {
        api_key,
        expires_in: jwt.api_key_expires_in(),
    })))
}
