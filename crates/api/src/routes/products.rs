use axum::routing::get;
use axum::Router;

use crate::handlers::products;
use crate::state::AppState;

/// Routes mounted at `/products`.
///
/// ```text
/// GET    /      -> list (API key)
/// POST   /      -> create (admin)
/// GET    /{id}  -> get_by_id (API key)
/// PATCH  /{id}  -> update (admin)
/// DELETE /{id}  -> delete (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(products::list).post(products::create))
        .route(
            "/{id}",
            get(products::get_by_id)
                .patch(products::update)
                .delete(products::delete),
        )
}
