//! Error types raised by the persistence layer.

use storefront_core::error::CoreError;

/// Composed statement and its value list disagree. Indicates a bug in the
/// composer, never bad user input.
#[derive(Debug, thiserror::Error)]
pub enum QueryBuildError {
    #[error("Placeholder mismatch: statement uses {placeholders} placeholder(s) but {values} value(s) were supplied")]
    PlaceholderMismatch { placeholders: usize, values: usize },
}

/// An aggregate document did not decode into the expected shape.
#[derive(Debug, thiserror::Error)]
#[error("Failed to hydrate {target}: {source}")]
pub struct HydrationError {
    pub target: &'static str,
    #[source]
    pub source: serde_json::Error,
}

/// Failure inside a multi-step write. Nothing from the write was persisted.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("{aggregate}: failed to open transaction: {source}")]
    TransactionOpen {
        aggregate: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("{aggregate}: step '{step}' failed: {source}")]
    Step {
        aggregate: &'static str,
        step: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("{aggregate}: commit failed: {source}")]
    Commit {
        aggregate: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

impl WriteError {
    /// The underlying database error.
    pub fn source_error(&self) -> &sqlx::Error {
        match self {
            WriteError::TransactionOpen { source, .. }
            | WriteError::Step { source, .. }
            | WriteError::Commit { source, .. } => source,
        }
    }
}

/// Top-level error for repository operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    QueryBuild(#[from] QueryBuildError),

    #[error(transparent)]
    Hydration(#[from] HydrationError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl DbError {
    /// Whether this error means the addressed row does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            DbError::Core(CoreError::NotFound { .. }) => true,
            DbError::Database(sqlx::Error::RowNotFound) => true,
            DbError::Write(err) => matches!(err.source_error(), sqlx::Error::RowNotFound),
            _ => false,
        }
    }

    /// Underlying database error, if any.
    pub fn as_database_error(&self) -> Option<&sqlx::Error> {
        match self {
            DbError::Database(err) => Some(err),
            DbError::Write(err) => Some(err.source_error()),
            _ => None,
        }
    }
}
