//! Access tokens, refresh tokens, API keys and admin tokens.
//!
//! Access tokens are HS256 JWTs carrying [`Claims`]. Refresh tokens are opaque
//! random strings; the server stores only their SHA-256 digest in
//! `user_sessions`, so a leaked table cannot be replayed.
//!
//! API keys and admin tokens are HS256 JWTs carrying [`ServiceClaims`], each
//! signed with its own secret. Neither identifies a user.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use storefront_core::roles::ROLE_ADMIN;
use storefront_core::types::{DbId, Timestamp};
use uuid::Uuid;

/// Payload of every access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User id.
    pub sub: DbId,
    /// Role name, `customer` or `admin`.
    pub role: String,
    pub exp: i64,
    pub iat: i64,
    /// Unique token id.
    pub jti: String,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

/// Payload of API keys and admin tokens.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServiceClaims {
    pub sub: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

pub const API_KEY_SUBJECT: &str = "api-key";
pub const API_KEY_AUDIENCE: &str = "apikey";
pub const ADMIN_TOKEN_SUBJECT: &str = "admin-token";
pub const ADMIN_TOKEN_AUDIENCE: &str = "admin";

/// Admin tokens are short-lived: five minutes.
pub const ADMIN_TOKEN_EXPIRY_SECS: i64 = 300;

const DEFAULT_ACCESS_EXPIRY_MINS: i64 = 15;
const DEFAULT_REFRESH_EXPIRY_DAYS: i64 = 7;
const DEFAULT_API_KEY_EXPIRY_DAYS: i64 = 30;

/// Signing secrets and token lifetimes.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Signs access tokens.
    pub secret: String,
    /// Signs API keys.
    pub api_key_secret: String,
    /// Signs admin tokens.
    pub admin_key_secret: String,
    pub access_token_expiry_mins: i64,
    pub refresh_token_expiry_days: i64,
    pub api_key_expiry_days: i64,
}

impl JwtConfig {
    /// Load JWT configuration from environment variables.
    ///
    /// | Env Var                    | Required | Default |
    /// |----------------------------|----------|---------|
    /// | `JWT_SECRET`               | **yes**  | --      |
    /// | `JWT_API_KEY`              | **yes**  | --      |
    /// | `JWT_ADMIN_KEY`            | **yes**  | --      |
    /// | `JWT_ACCESS_EXPIRY_MINS`   | no       | `15`    |
    /// | `JWT_REFRESH_EXPIRY_DAYS`  | no       | `7`     |
    /// | `JWT_API_KEY_EXPIRY_DAYS`  | no       | `30`    |
    ///
    /// # Panics
    ///
    /// Panics if a secret is missing or empty, or a lifetime is not an
    /// integer.
    pub fn from_env() -> Self {
        let secret = required_secret("JWT_SECRET");
        let api_key_secret = required_secret("JWT_API_KEY");
        let admin_key_secret = required_secret("JWT_ADMIN_KEY");

        let access_token_expiry_mins = std::env::var("JWT_ACCESS_EXPIRY_MINS")
            .map(|v| v.parse().expect("JWT_ACCESS_EXPIRY_MINS must be a valid i64"))
            .unwrap_or(DEFAULT_ACCESS_EXPIRY_MINS);
        let refresh_token_expiry_days = std::env::var("JWT_REFRESH_EXPIRY_DAYS")
            .map(|v| v.parse().expect("JWT_REFRESH_EXPIRY_DAYS must be a valid i64"))
            .unwrap_or(DEFAULT_REFRESH_EXPIRY_DAYS);
        let api_key_expiry_days = std::env::var("JWT_API_KEY_EXPIRY_DAYS")
            .map(|v| v.parse().expect("JWT_API_KEY_EXPIRY_DAYS must be a valid i64"))
            .unwrap_or(DEFAULT_API_KEY_EXPIRY_DAYS);

        Self {
            secret,
            api_key_secret,
            admin_key_secret,
            access_token_expiry_mins,
            refresh_token_expiry_days,
            api_key_expiry_days,
        }
    }

    /// Access token lifetime in seconds, as reported to clients.
    pub fn access_expires_in(&self) -> i64 {
        self.access_token_expiry_mins * 60
    }

    /// Expiry of a refresh token issued now.
    pub fn refresh_expires_at(&self) -> Timestamp {
        Utc::now() + Duration::days(self.refresh_token_expiry_days)
    }

    /// Sign an access token for `user_id` with `role`.
    pub fn issue_access_token(
        &self,
        user_id: DbId,
        role: &str,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id,
            role: role.to_string(),
            exp: now + self.access_expires_in(),
            iat: now,
            jti: Uuid::new_v4().to_string(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
    }

    /// Verify signature and expiry, returning the claims.
    pub fn decode_access_token(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
    }

    /// API key lifetime in seconds.
    pub fn api_key_expires_in(&self) -> i64 {
        self.api_key_expiry_days * 24 * 60 * 60
    }

    /// Sign a new API key.
    pub fn issue_api_key(&self) -> Result<String, jsonwebtoken::errors::Error> {
        issue_service_token(
            &self.api_key_secret,
            API_KEY_SUBJECT,
            API_KEY_AUDIENCE,
            self.api_key_expires_in(),
        )
    }

    pub fn decode_api_key(&self, token: &str) -> Result<ServiceClaims, jsonwebtoken::errors::Error> {
        decode_service_token(&self.api_key_secret, API_KEY_SUBJECT, API_KEY_AUDIENCE, token)
    }

    /// Sign a five-minute admin token.
    pub fn issue_admin_token(&self) -> Result<String, jsonwebtoken::errors::Error> {
        issue_service_token(
            &self.admin_key_secret,
            ADMIN_TOKEN_SUBJECT,
            ADMIN_TOKEN_AUDIENCE,
            ADMIN_TOKEN_EXPIRY_SECS,
        )
    }

    pub fn decode_admin_token(
        &self,
        token: &str,
    ) -> Result<ServiceClaims, jsonwebtoken::errors::Error> {
        decode_service_token(
            &self.admin_key_secret,
            ADMIN_TOKEN_SUBJECT,
            ADMIN_TOKEN_AUDIENCE,
            token,
        )
    }
}

fn required_secret(var: &str) -> String {
    let value = std::env::var(var).unwrap_or_else(|_| panic!("{var} must be set"));
    assert!(!value.is_empty(), "{var} must not be empty");
    value
}

fn issue_service_token(
    secret: &str,
    subject: &str,
    audience: &str,
    lifetime_secs: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now().timestamp();
    let claims = ServiceClaims {
        sub: subject.to_string(),
        aud: audience.to_string(),
        exp: now + lifetime_secs,
        iat: now,
        jti: Uuid::new_v4().to_string(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

fn decode_service_token(
    secret: &str,
    subject: &str,
    audience: &str,
    token: &str,
) -> Result<ServiceClaims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::default();
    validation.set_audience(&[audience]);
    validation.sub = Some(subject.to_string());
    decode::<ServiceClaims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
}

/// A fresh refresh token as `(plaintext, sha256_hex)`.
pub fn generate_refresh_token() -> (String, String) {
    let plaintext = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
    let hash = hash_refresh_token(&plaintext);
    (plaintext, hash)
}

pub fn hash_refresh_token(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}
