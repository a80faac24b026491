//! Refresh-token sessions.

use storefront_core::types::{DbId, Timestamp};

/// A refresh token about to be persisted. Only the SHA-256 hex digest of the
/// opaque token is stored.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub user_id: DbId,
    pub refresh_token_hash: String,
    pub expires_at: Timestamp,
}
