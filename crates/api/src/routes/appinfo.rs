use axum::routing::get;
use axum::Router;

use crate::handlers::appinfo;
use crate::state::AppState;

/// Routes mounted at `/appinfo`.
///
/// ```text
/// GET /apikey  -> api_key (requires auth)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/apikey", get(appinfo::api_key))
}
