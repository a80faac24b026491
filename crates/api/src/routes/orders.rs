use axum::routing::get;
use axum::Router;

use crate::handlers::orders;
use crate::state::AppState;

/// Routes mounted at `/orders`.
///
/// ```text
/// GET   /      -> list (admin)
/// POST  /      -> create (requires auth)
/// GET   /{id}  -> get_by_id (owner or admin)
/// PATCH /{id}  -> update (owner or admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::list).post(orders::create))
        .route("/{id}", get(orders::get_by_id).patch(orders::update))
}
