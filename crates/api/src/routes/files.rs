use axum::routing::{patch, post};
use axum::Router;

use crate::handlers::files;
use crate::state::AppState;

/// Routes mounted at `/files`.
///
/// ```text
/// POST  /upload  -> upload (admin, multipart)
/// PATCH /delete  -> delete (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/upload", post(files::upload))
        .route("/delete", patch(files::delete))
}
