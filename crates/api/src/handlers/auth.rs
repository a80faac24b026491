//! Handlers for the `/auth` resource (sign-up, sign-in, refresh, sign-out).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use storefront_core::error::CoreError;
use storefront_core::roles::{ROLE_ID_ADMIN, ROLE_ID_CUSTOMER};
use storefront_core::types::DbId;
use storefront_db::models::session::NewSession;
use storefront_db::models::user::{CreateUser, User, UserResponse};
use storefront_db::repositories::{SessionRepo, UserRepo};
use validator::Validate;

use crate::auth::jwt::{generate_refresh_token, hash_refresh_token};
use crate::auth::password::{hash_password, verify_password};
use crate::error::{AppError, AppResult};
use crate::middleware::api_key::RequireApiKey;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdminToken;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/signup` and `POST /auth/signup-admin`.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 1, max = 255, message = "username must be 1 to 255 characters"))]
    pub username: String,
    #[validate(email(message = "email pattern is invalid"))]
    pub email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
}

/// Request body for `POST /auth/signin`.
#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

/// Request body for `POST /auth/refresh`.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Tokens plus the user they were issued for.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserResponse,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/signup
///
/// Register a customer account and sign it in.
pub async fn signup(
    _key: RequireApiKey,
    State(state): State<AppState>,
    Json(input): Json<SignupRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let user = register(&state, input, ROLE_ID_CUSTOMER).await?;
    let response = create_auth_response(&state, &user).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/v1/auth/signup-admin
///
/// Register an admin account. Needs an admin access token and an admin token
/// from `GET /users/admin/secret`.
pub async fn signup_admin(
    RequireAdminToken(admin): RequireAdminToken,
    State(state): State<AppState>,
    Json(input): Json<SignupRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let user = register(&state, input, ROLE_ID_ADMIN).await?;
    tracing::info!(created_by = admin.user_id, user_id = user.id, "Admin account created");
    let response = create_auth_response(&state, &user).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/v1/auth/signin
///
/// Authenticate with email + password.
pub async fn signin(
    _key: RequireApiKey,
    State(state): State<AppState>,
    Json(input): Json<SigninRequest>,
) -> AppResult<Json<AuthResponse>> {
    let invalid = || AppError::Core(CoreError::Unauthorized("Invalid email or password".into()));

    let user = UserRepo::find_by_email(&state.pool, input.email.trim())
        .await?
        .ok_or_else(invalid)?;

    let valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !valid {
        return Err(invalid());
    }

    Ok(Json(create_auth_response(&state, &user).await?))
}

/// POST /api/v1/auth/refresh
///
/// Exchange a refresh token for a new token pair. The presented token is
/// revoked in the same statement that stores its replacement.
pub async fn refresh(
    _key: RequireApiKey,
    State(state): State<AppState>,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let (refresh_plaintext, refresh_hash) = generate_refresh_token();

    let user_id = SessionRepo::rotate(
        &state.pool,
        &hash_refresh_token(&input.refresh_token),
        &refresh_hash,
        state.config.jwt.refresh_expires_at(),
    )
    .await?
    .ok_or_else(|| CoreError::Unauthorized("Invalid or expired refresh token".into()))?;

    let user = UserRepo::find_by_id(&state.pool, user_id)
        .await?
        .ok_or_else(|| CoreError::Unauthorized("User no longer exists".into()))?;

    Ok(Json(token_pair(&state, &user, refresh_plaintext)?))
}

/// POST /api/v1/auth/signout
///
/// Revoke every session of the caller. Returns 204 No Content.
pub async fn signout(
    _key: RequireApiKey,
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<StatusCode> {
    let revoked = SessionRepo::close_all(&state.pool, auth_user.user_id).await?;
    tracing::debug!(user_id = auth_user.user_id, revoked, "Signed out");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn register(state: &AppState, input: SignupRequest, role_id: DbId) -> AppResult<User> {
    input
        .validate()
        .map_err(|e| CoreError::Validation(e.to_string()))?;

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            username: input.username,
            email: input.email,
            password_hash,
            role_id,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, role = %user.role, "User registered");
    Ok(user)
}

/// Open a fresh session for `user` and return both tokens.
async fn create_auth_response(state: &AppState, user: &User) -> AppResult<AuthResponse> {
    let (refresh_plaintext, refresh_hash) = generate_refresh_token();
    SessionRepo::open(
        &state.pool,
        &NewSession {
            user_id: user.id,
            refresh_token_hash: refresh_hash,
            expires_at: state.config.jwt.refresh_expires_at(),
        },
    )
    .await?;

    token_pair(state, user, refresh_plaintext)
}

/// Sign an access token for `user` and pair it with an already-stored
/// refresh token.
fn token_pair(state: &AppState, user: &User, refresh_token: String) -> AppResult<AuthResponse> {
    let jwt = &state.config.jwt;
    let access_token = jwt
        .issue_access_token(user.id, &user.role)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    Ok(AuthResponse {
        access_token,
        refresh_token,
        expires_in: jwt.access_expires_in(),
        user: UserResponse::from(user),
    })
}
