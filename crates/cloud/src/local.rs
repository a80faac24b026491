//! Local file system backend.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use storefront_core::error::CoreError;
use storefront_core::storage::{ObjectStorage, StoredObject, UploadRequest};
use tokio::fs;

use crate::error::StorageError;
use crate::worker::WorkerPool;
use crate::{file_name, public_url, validate_destination};

/// Stores objects as files under `root`, keyed by their destination path.
#[derive(Debug, Clone)]
pub struct LocalObjectStorage {
    root: Arc<PathBuf>,
    public_url: Arc<str>,
    pool: WorkerPool,
}

impl LocalObjectStorage {
    /// Create the backend, creating `root` if it does not exist.
    pub async fn new(root: PathBuf, public_url: String, pool: WorkerPool) -> Result<Self, StorageError> {
        fs::create_dir_all(&root).await.map_err(|source| StorageError::Io {
            path: root.display().to_string(),
            source,
        })?;
        Ok(Self {
            root: Arc::new(root),
            public_url: public_url.into(),
            pool,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

async fn write_object(root: &Path, base_url: &str, file: UploadRequest) -> Result<StoredObject, StorageError> {
    validate_destination(&file.destination)?;
    let path = root.join(&file.destination);
    let io_err = |source| StorageError::Io {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.map_err(io_err)?;
    }
    fs::write(&path, &file.bytes).await.map_err(io_err)?;

    tracing::debug!(destination = %file.destination, bytes = file.bytes.len(), "Stored object locally");
    Ok(StoredObject {
        filename: file_name(&file.destination),
        url: public_url(base_url, &file.destination),
    })
}

async fn remove_object(root: &Path, destination: String) -> Result<(), StorageError> {
    validate_destination(&destination)?;
    let path = root.join(&destination);
    match fs::remove_file(&path).await {
        Ok(()) => Ok(()),
        // Already gone.
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(StorageError::Io {
            path: path.display().to_string(),
            source,
        }),
    }
}

#[async_trait]
impl ObjectStorage for LocalObjectStorage {
    async fn upload(&self, files: Vec<UploadRequest>) -> Result<Vec<StoredObject>, CoreError> {
        let root = Arc::clone(&self.root);
        let base_url = Arc::clone(&self.public_url);
        let stored = self
            .pool
            .run(files, move |file| {
                let root = Arc::clone(&root);
                let base_url = Arc::clone(&base_url);
                async move { write_object(&root, &base_url, file).await }
            })
            .await?;
        Ok(stored)
    }

    async fn delete(&self, destinations: Vec<String>) -> Result<(), CoreError> {
        let root = Arc::clone(&self.root);
        self.pool
            .run(destinations, move |destination| {
                let root = Arc::clone(&root);
                async move { remove_object(&root, destination).await }
            })
            .await?;
        Ok(())
    }
}
