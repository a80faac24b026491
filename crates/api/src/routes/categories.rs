use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::categories;
use crate::state::AppState;

/// Routes mounted at `/categories`.
///
/// ```text
/// GET    /      -> list (API key)
/// POST   /      -> create (admin)
/// DELETE /{id}  -> delete (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::list).post(categories::create))
        .route("/{id}", delete(categories::delete))
}
