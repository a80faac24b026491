//! Route definitions for the `/auth` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST /signup        -> signup (API key)
/// POST /signup-admin  -> signup_admin (admin + admin token)
/// POST /signin        -> signin (API key)
/// POST /refresh       -> refresh (API key)
/// POST /signout       -> signout (API key + auth)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/signup-admin", post(auth::signup_admin))
        .route("/signin", post(auth::signin))
        .route("/refresh", post(auth::refresh))
        .route("/signout", post(auth::signout))
}
