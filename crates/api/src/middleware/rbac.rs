//! Role-based access control extractors.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use storefront_core::error::CoreError;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Requires the `admin` role. Rejects with 403 Forbidden otherwise.
///
/// ```ignore
/// async fn admin_only(RequireAdmin(admin): RequireAdmin) -> AppResult<StatusCode> {
///     Ok(StatusCode::NO_CONTENT)
/// }
/// ```
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(CoreError::Forbidden("Admin role required".into()).into());
        }
        Ok(RequireAdmin(user))
    }
}

/// Header carrying a short-lived admin token.
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Requires the `admin` role plus a live admin token in `X-Admin-Token`.
///
/// Used where an admin access token alone is not enough, such as creating
/// another admin.
pub struct RequireAdminToken(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdminToken {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAdmin(user) = RequireAdmin::from_request_parts(parts, state).await?;

        let token = parts
            .headers
            .get(ADMIN_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| CoreError::Forbidden("Missing admin token".into()))?;
        state
            .config
            .jwt
            .decode_admin_token(token.trim())
            .map_err(|_| CoreError::Forbidden("Invalid or expired admin token".into()))?;

        Ok(RequireAdminToken(user))
    }
}
