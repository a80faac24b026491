//! Object-storage collaborator contract and file validation helpers.
//!
//! Product images and transfer slips live in an external object store. The
//! persistence layer only ever needs to delete objects; the HTTP layer also
//! uploads them. Implementations live in the `cloud` crate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Extensions accepted for uploaded images.
pub const ACCEPTED_IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Prefix under which product images are stored.
pub const PRODUCT_IMAGE_PREFIX: &str = "images/products";

/// A file waiting to be uploaded.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Full object key, e.g. `images/products/3f2a....png`.
    pub destination: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// A stored object as reported back to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    pub filename: String,
    pub url: String,
}

/// External object store.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Upload all files, returning one [`StoredObject`] per request in order.
    async fn upload(&self, files: Vec<UploadRequest>) -> Result<Vec<StoredObject>, CoreError>;

    /// Delete the objects at the given destinations.
    async fn delete(&self, destinations: Vec<String>) -> Result<(), CoreError>;
}

/// Object key of a product image.
pub fn product_image_destination(filename: &str) -> String {
    format!("{PRODUCT_IMAGE_PREFIX}/{filename}")
}

/// Return the lowercase extension of `filename` if it is an accepted image type.
pub fn validate_image_extension(filename: &str) -> Result<String, CoreError> {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    if ACCEPTED_IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(CoreError::Validation(format!(
            "File '{filename}' has an unsupported extension. Accepted: {ACCEPTED_IMAGE_EXTENSIONS:?}"
        )))
    }
}

/// Reject files larger than `limit_bytes`.
pub fn validate_file_size(size: usize, limit_bytes: usize) -> Result<(), CoreError> {
    if size > limit_bytes {
        let mib = limit_bytes.div_ceil(1024 * 1024);
        return Err(CoreError::Validation(format!(
            "File size must be less than {mib} MiB"
        )));
    }
    Ok(())
}

/// MIME type for an accepted image extension.
pub fn image_content_type(ext: &str) -> &'static str {
    match ext {
        "png" => "image/png",
        _ => "image/jpeg",
    }
}
