//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- the caller identified by a Bearer access token.
//! - [`rbac::RequireAdmin`] -- requires the `admin` role.
//! - [`rbac::RequireAdminToken`] -- admin role plus a live admin token.
//! - [`api_key::RequireApiKey`] -- requires a valid `X-Api-Key`.

pub mod api_key;
pub mod auth;
pub mod rbac;
