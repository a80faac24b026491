use crate::types::DbId;

/// Domain failures shared by every storefront crate.
///
/// `Validation` messages are shown to API callers as-is; `Internal` ones are
/// logged and replaced with a generic message.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{entity} {id} does not exist")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Already exists: {0}")]
    Conflict(String),

    #[error("Not authenticated: {0}")]
    Unauthorized(String),

    #[error("Not permitted: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
