//! Authentication primitives.
//!
//! - [`password`] -- Argon2id password hashing and sign-up credential checks.
//! - [`jwt`] -- signed access tokens and opaque refresh tokens.

pub mod jwt;
pub mod password;
