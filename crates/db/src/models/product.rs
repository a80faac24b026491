//! Product aggregate and DTOs.

use serde::{Deserialize, Serialize};
use storefront_core::types::{DbId, Timestamp};

use super::category::{Category, CategoryRef};
use super::image::{Image, NewImage};
use super::null_as_default;

/// A product with its category and images, hydrated from one aggregate
/// document. The same shape is stored as an order line snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: DbId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<Image>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a product.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProduct {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    pub category: Option<CategoryRef>,
    #[serde(default)]
    pub images: Vec<NewImage>,
}

impl CreateProduct {
    pub fn category_id(&self) -> Option<DbId> {
        self.category.map(|c| c.id)
    }
}

/// DTO for a partial product update. Empty or absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProduct {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category: Option<CategoryRef>,
    #[serde(default)]
    pub images: Vec<NewImage>,
}
