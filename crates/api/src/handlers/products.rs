//! Handlers for the `/products` resource.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use storefront_core::catalog::{ProductFilter, ProductListParams};
use storefront_core::listing::Page;
use storefront_core::storage::product_image_destination;
use storefront_core::types::DbId;
use storefront_db::models::product::{CreateProduct, Product, UpdateProduct};
use storefront_db::repositories::ProductRepo;

use crate::error::AppResult;
use crate::middleware::api_key::RequireApiKey;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/products?id=&search=&page=&limit=&order_by=&sort=
///
/// Unknown sort fields or directions fall back to `title ASC`.
pub async fn list(
    _key: RequireApiKey,
    State(state): State<AppState>,
    Query(params): Query<ProductListParams>,
) -> AppResult<Json<Page<Product>>> {
    let filter = ProductFilter::from(&params);
    let (products, total) = ProductRepo::find(&state.pool, &filter).await?;
    Ok(Json(Page::new(products, filter.window, total)))
}

/// GET /api/v1/products/{id}
pub async fn get_by_id(
    _key: RequireApiKey,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Product>>> {
    let product = ProductRepo::find_one(&state.pool, id).await?;
    Ok(Json(DataResponse::new(product)))
}

/// POST /api/v1/products
pub async fn create(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateProduct>,
) -> AppResult<(StatusCode, Json<DataResponse<Product>>)> {
    let product = ProductRepo::insert(&state.pool, &input).await?;
    tracing::info!(product_id = product.id, "Product created");
    Ok((StatusCode::CREATED, Json(DataResponse::new(product))))
}

/// PATCH /api/v1/products/{id}
///
/// Partial update. A non-empty `images` list replaces the current images.
pub async fn update(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateProduct>,
) -> AppResult<Json<DataResponse<Product>>> {
    let product = ProductRepo::update(&state.pool, Arc::clone(&state.storage), id, &input).await?;
    tracing::info!(product_id = id, "Product updated");
    Ok(Json(DataResponse::new(product)))
}

/// DELETE /api/v1/products/{id}
///
/// Removes the product's image objects from storage, then the row.
pub async fn delete(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let product = ProductRepo::find_one(&state.pool, id).await?;

    let destinations: Vec<String> = product
        .images
        .iter()
        .map(|image| product_image_destination(&image.filename))
        .collect();
    if !destinations.is_empty() {
        state.storage.delete(destinations).await?;
    }

    ProductRepo::delete(&state.pool, id).await?;
    tracing::info!(product_id = id, images = product.images.len(), "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}
