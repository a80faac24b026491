//! Category entity and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use storefront_core::types::DbId;

/// A row from the `categories` table. Also embedded in product documents.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Category {
    pub id: DbId,
    pub title: String,
}

/// Reference to an existing category by id (`{"id": 1}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: DbId,
}

/// DTO for creating a category.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategory {
    pub title: String,
}

/// Filter for listing categories.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryQuery {
    pub title: Option<String>,
}
