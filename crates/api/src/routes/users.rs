use axum::routing::get;
use axum::Router;

use crate::handlers::users;
use crate::state::AppState;

/// Routes mounted at `/users`.
///
/// ```text
/// GET /me            -> me
/// GET /admin/secret  -> admin_secret (admin)
/// GET /{id}          -> get_by_id (owner or admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(users::me))
        .route("/admin/secret", get(users::admin_secret))
        .route("/{id}", get(users::get_by_id))
}
