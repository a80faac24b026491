//! Product image entity and DTO.

use serde::{Deserialize, Serialize};
use storefront_core::types::DbId;

/// A row from the `images` table, as embedded in product documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub id: DbId,
    pub filename: String,
    pub url: String,
    pub product_id: DbId,
}

/// An image to attach to a product. The file must already be uploaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewImage {
    pub filename: String,
    pub url: String,
}
