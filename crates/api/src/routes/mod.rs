pub mod appinfo;
pub mod auth;
pub mod categories;
pub mod files;
pub mod health;
pub mod orders;
pub mod products;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /auth          signup, signup-admin, signin, refresh, signout
/// /appinfo       apikey
/// /users         me, admin/secret, {id}
/// /categories    list, create (admin), delete (admin)
/// /products      list, get, create/update/delete (admin)
/// /orders        list (admin), get, create, update
/// /files         upload, delete (admin)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/appinfo", appinfo::router())
        .nest("/users", users::router())
        .nest("/categories", categories::router())
        .nest("/products", products::router())
        .nest("/orders", orders::router())
        .nest("/files", files::router())
}
