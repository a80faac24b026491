#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use storefront_api::auth::jwt::JwtConfig;
use storefront_api::auth::password::hash_password;
use storefront_api::config::ServerConfig;
use storefront_api::router::build_app_router;
use storefront_api::state::AppState;
use storefront_cloud::{StorageBackend, StorageSettings};
use storefront_core::roles::{ROLE_ID_ADMIN, ROLE_ID_CUSTOMER};
use storefront_core::types::DbId;
use storefront_db::models::user::{CreateUser, User};
use storefront_db::repositories::UserRepo;

pub const TEST_PASSWORD: &str = "storefront-pass-123";
pub const PUBLIC_URL: &str = "http://localhost:3000/static";

pub fn test_jwt() -> JwtConfig {
    JwtConfig {
        secret: "storefront-integration-secret".to_string(),
        api_key_secret: "storefront-integration-api-key".to_string(),
        admin_key_secret: "storefront-integration-admin-key".to_string(),
        access_token_expiry_mins: 15,
        refresh_token_expiry_days: 7,
        api_key_expiry_days: 30,
    }
}

/// A valid API key; every request helper below sends one unless its name
/// says otherwise.
pub fn api_key() -> String {
    test_jwt().issue_api_key().expect("API key generation should succeed")
}

/// Build a test `ServerConfig` whose local storage lives under `storage_root`.
pub fn test_config(storage_root: &Path) -> ServerConfig {
    ServerConfig {
        database_url: String::new(),
        db_max_connections: 5,
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        file_limit_bytes: 1024,
        jwt: test_jwt(),
        storage: StorageSettings {
            backend: StorageBackend::Local {
                root: storage_root.to_path_buf(),
            },
            public_url: PUBLIC_URL.to_string(),
            workers: 2,
        },
    }
}

/// Build the full application router, using the given pool and a local
/// storage root.
pub async fn build_test_app(pool: PgPool, storage_root: &Path) -> Router {
    let config = test_config(storage_root);
    let storage = storefront_cloud::build_storage(&config.storage)
        .await
        .expect("local storage should initialise");

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        storage,
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Users and tokens
// ---------------------------------------------------------------------------

pub async fn create_user(pool: &PgPool, username: &str, role_id: DbId) -> User {
    UserRepo::create(
        pool,
        &CreateUser {
            username: username.to_string(),
            email: format!("{username}@shop.test"),
            password_hash: hash_password(TEST_PASSWORD).expect("hashing should succeed"),
            role_id,
        },
    )
    .await
    .expect("user creation should succeed")
}

pub fn token_for(user: &User) -> String {
    test_jwt()
        .issue_access_token(user.id, &user.role)
        .expect("token generation should succeed")
}

pub async fn admin(pool: &PgPool) -> (User, String) {
    let user = create_user(pool, "admin", ROLE_ID_ADMIN).await;
    let token = token_for(&user);
    (user, token)
}

pub async fn customer(pool: &PgPool, username: &str) -> (User, String) {
    let user = create_user(pool, username, ROLE_ID_CUSTOMER).await;
    let token = token_for(&user);
    (user, token)
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.expect("request should complete")
}

fn json_request(method: &str, uri: &str, body: &serde_json::Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-api-key", api_key());
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    let request = Request::get(uri)
        .header("x-api-key", api_key())
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn get_without_key(app: &Router, uri: &str) -> Response<Body> {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

pub async fn get_with_key(app: &Router, uri: &str, key: &str) -> Response<Body> {
    let request = Request::get(uri)
        .header("x-api-key", key)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn get_auth(app: &Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::get(uri)
        .header("authorization", format!("Bearer {token}"))
        .header("x-api-key", api_key())
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: &Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, json_request("POST", uri, &body, None)).await
}

pub async fn post_json_without_key(app: &Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

/// POST with an access token and an `X-Admin-Token`.
pub async fn post_json_admin(
    app: &Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
    admin_token: &str,
) -> Response<Body> {
    let mut request = json_request("POST", uri, &body, Some(token));
    request
        .headers_mut()
        .insert("x-admin-token", admin_token.parse().unwrap());
    send(app, request).await
}

pub async fn post_json_auth(app: &Router, uri: &str, body: serde_json::Value, token: &str) -> Response<Body> {
    send(app, json_request("POST", uri, &body, Some(token))).await
}

pub async fn patch_json_auth(app: &Router, uri: &str, body: serde_json::Value, token: &str) -> Response<Body> {
    send(app, json_request("PATCH", uri, &body, Some(token))).await
}

pub async fn delete_auth(app: &Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::delete(uri)
        .header("authorization", format!("Bearer {token}"))
        .header("x-api-key", api_key())
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("response body should be JSON")
}
