//! Bearer-token authentication extractor.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use storefront_core::error::CoreError;
use storefront_core::roles::ROLE_ADMIN;
use storefront_core::types::DbId;

use crate::error::AppError;
use crate::state::AppState;

/// The authenticated caller, taken from a valid `Authorization: Bearer` token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: DbId,
    /// `customer` or `admin`.
    pub role: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }

    /// Allow the owner of a resource or any admin.
    pub fn ensure_owner_or_admin(&self, owner_id: DbId) -> Result<(), AppError> {
        if self.is_admin() || self.user_id == owner_id {
            Ok(())
        } else {
            Err(CoreError::Forbidden("You may only access your own resources".into()).into())
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| CoreError::Unauthorized("Missing Authorization header".into()))?;

        let token = header.strip_prefix("Bearer ").ok_or_else(|| {
            CoreError::Unauthorized("Invalid Authorization format. Expected: Bearer <token>".into())
        })?;

        let claims = state
            .config
            .jwt
            .decode_access_token(token)
            .map_err(|_| CoreError::Unauthorized("Invalid or expired token".into()))?;

        Ok(AuthUser {
            user_id: claims.sub,
            role: claims.role,
        })
    }
}
