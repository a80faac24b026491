//! Handlers for the `/categories` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use storefront_core::types::DbId;
use storefront_db::models::category::{Category, CategoryQuery, CreateCategory};
use storefront_db::repositories::CategoryRepo;

use crate::error::AppResult;
use crate::middleware::api_key::RequireApiKey;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/categories?title=
pub async fn list(
    _key: RequireApiKey,
    State(state): State<AppState>,
    Query(params): Query<CategoryQuery>,
) -> AppResult<Json<DataResponse<Vec<Category>>>> {
    let categories = CategoryRepo::list(&state.pool, &params).await?;
    Ok(Json(DataResponse::new(categories)))
}

/// POST /api/v1/categories
///
/// Insert a batch of categories. All or nothing.
pub async fn create(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<Vec<CreateCategory>>,
) -> AppResult<(StatusCode, Json<DataResponse<Vec<Category>>>)> {
    let categories = CategoryRepo::insert_many(&state.pool, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(categories))))
}

/// DELETE /api/v1/categories/{id}
pub async fn delete(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    CategoryRepo::delete(&state.pool, id).await?;
    tracing::info!(category_id = id, "Category deleted");
    Ok(StatusCode::NO_CONTENT)
}
