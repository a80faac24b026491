//! Object-storage backends for product images and transfer slips.
//!
//! Both backends implement [`storefront_core::storage::ObjectStorage`] and fan
//! uploads and deletes out over a [`WorkerPool`].

use std::path::PathBuf;
use std::sync::Arc;

use storefront_core::storage::ObjectStorage;

pub mod error;
pub mod local;
pub mod s3;
pub mod worker;

pub use error::StorageError;
pub use local::LocalObjectStorage;
pub use s3::S3ObjectStorage;
pub use worker::WorkerPool;

/// Default number of concurrent upload/delete workers.
pub const DEFAULT_WORKERS: usize = 5;

/// Which backend to use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// Files under a local directory, served by the API under `/static`.
    Local { root: PathBuf },
    /// An S3 (or S3-compatible) bucket.
    S3 {
        bucket: String,
        endpoint_url: Option<String>,
    },
}

/// Storage settings resolved from the environment by the API crate.
#[derive(Debug, Clone)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    /// Base URL prepended to object keys in returned URLs.
    pub public_url: String,
    pub workers: usize,
}

/// Build the configured backend.
pub async fn build_storage(settings: &StorageSettings) -> Result<Arc<dyn ObjectStorage>, StorageError> {
    let pool = WorkerPool::new(settings.workers);
    let storage: Arc<dyn ObjectStorage> = match &settings.backend {
        StorageBackend::Local { root } => Arc::new(
            LocalObjectStorage::new(root.clone(), settings.public_url.clone(), pool).await?,
        ),
        StorageBackend::S3 {
            bucket,
            endpoint_url,
        } => Arc::new(
            S3ObjectStorage::from_env(
                bucket.clone(),
                endpoint_url.clone(),
                settings.public_url.clone(),
                pool,
            )
            .await,
        ),
    };
    Ok(storage)
}

/// Public URL for an object key.
pub(crate) fn public_url(base: &str, destination: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), destination.trim_start_matches('/'))
}

/// Last path segment of an object key.
pub(crate) fn file_name(destination: &str) -> String {
    destination
        .rsplit('/')
        .next()
        .unwrap_or(destination)
        .to_string()
}

/// Reject keys that could escape the storage root.
pub(crate) fn validate_destination(destination: &str) -> Result<(), StorageError> {
    let trimmed = destination.trim();
    if trimmed.is_empty()
        || trimmed.starts_with('/')
        || trimmed.split('/').any(|segment| segment == ".." || segment.is_empty())
    {
        return Err(StorageError::InvalidDestination(destination.to_string()));
    }
    Ok(())
}
