use storefront_core::error::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Invalid object destination: {0}")]
    InvalidDestination(String),

    #[error("Storage I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("S3 request failed for {key}: {message}")]
    S3 { key: String, message: String },

    #[error("Storage worker failed: {0}")]
    Worker(String),
}

impl From<StorageError> for CoreError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidDestination(_) => CoreError::Validation(err.to_string()),
            other => CoreError::Internal(other.to_string()),
        }
    }
}
