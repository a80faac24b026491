//! API-key gate for public and sign-in routes.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use storefront_core::error::CoreError;

use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Requires a valid API key in `X-Api-Key`. Rejects with 401 otherwise.
///
/// ```ignore
/// async fn public_list(_key: RequireApiKey, State(state): State<AppState>) { .. }
/// ```
pub struct RequireApiKey;

impl FromRequestParts<AppState> for RequireApiKey {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let key = parts
            .headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| CoreError::Unauthorized("Missing API key".into()))?;

        state
            .config
            .jwt
            .decode_api_key(key.trim())
            .map_err(|_| CoreError::Unauthorized("Invalid or expired API key".into()))?;
        Ok(RequireApiKey)
    }
}
