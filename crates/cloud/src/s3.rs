//! S3 backend.

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use storefront_core::error::CoreError;
use storefront_core::storage::{ObjectStorage, StoredObject, UploadRequest};

use crate::error::StorageError;
use crate::worker::WorkerPool;
use crate::{file_name, public_url, validate_destination};

/// Stores objects in one S3 bucket, keyed by destination path.
#[derive(Debug, Clone)]
pub struct S3ObjectStorage {
    client: Client,
    bucket: String,
    public_url: String,
    pool: WorkerPool,
}

impl S3ObjectStorage {
    pub fn new(client: Client, bucket: String, public_url: String, pool: WorkerPool) -> Self {
        Self {
            client,
            bucket,
            public_url,
            pool,
        }
    }

    /// Build a client from the standard AWS environment (credentials, region).
    ///
    /// `endpoint_url` targets an S3-compatible service and switches to
    /// path-style addressing.
    pub async fn from_env(
        bucket: String,
        endpoint_url: Option<String>,
        public_url: String,
        pool: WorkerPool,
    ) -> Self {
        let shared = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = endpoint_url {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }
        let client = Client::from_conf(builder.build());
        Self::new(client, bucket, public_url, pool)
    }
}

#[async_trait]
impl ObjectStorage for S3ObjectStorage {
    async fn upload(&self, files: Vec<UploadRequest>) -> Result<Vec<StoredObject>, CoreError> {
        let client = self.client.clone();
        let bucket = self.bucket.clone();
        let base_url = self.public_url.clone();

        let stored = self
            .pool
            .run(files, move |file| {
                let client = client.clone();
                let bucket = bucket.clone();
                let base_url = base_url.clone();
                async move {
                    validate_destination(&file.destination)?;
                    client
                        .put_object()
                        .bucket(&bucket)
                        .key(&file.destination)
                        .content_type(&file.content_type)
                        .body(ByteStream::from(file.bytes))
                        .send()
                        .await
                        .map_err(|e| StorageError::S3 {
                            key: file.destination.clone(),
                            message: e.to_string(),
                        })?;
                    tracing::debug!(bucket = %bucket, key = %file.destination, "Uploaded object");
                    Ok(StoredObject {
                        filename: file_name(&file.destination),
                        url: public_url(&base_url, &file.destination),
                    })
                }
            })
            .await?;
        Ok(stored)
    }

    async fn delete(&self, destinations: Vec<String>) -> Result<(), CoreError> {
        let client = self.client.clone();
        let bucket = self.bucket.clone();

        self.pool
            .run(destinations, move |key| {
                let client = client.clone();
                let bucket = bucket.clone();
                async move {
                    validate_destination(&key)?;
                    client
                        .delete_object()
                        .bucket(&bucket)
                        .key(&key)
                        .send()
                        .await
                        .map_err(|e| StorageError::S3 {
                            key: key.clone(),
                            message: e.to_string(),
                        })?;
                    Ok(())
                }
            })
            .await?;
        Ok(())
    }
}
