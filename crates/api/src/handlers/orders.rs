//! Handlers for the `/orders` resource.
//!
//! Listing is admin-only. Reading and updating an order is allowed for its
//! owner and for admins; customers may only cancel.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use storefront_core::listing::Page;
use storefront_core::order::{validate_status_for_role, OrderFilter, OrderListParams};
use storefront_core::types::DbId;
use storefront_db::models::order::{CreateOrder, Order, UpdateOrder};
use storefront_db::repositories::OrderRepo;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/orders?id=&search=&status=&start_date=&end_date=&page=&limit=&order_by=&sort=
pub async fn list(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<OrderListParams>,
) -> AppResult<Json<Page<Order>>> {
    let filter = OrderFilter::from_params(&params)?;
    let (orders, total) = OrderRepo::find(&state.pool, &filter).await?;
    Ok(Json(Page::new(orders, filter.window, total)))
}

/// GET /api/v1/orders/{id}
pub async fn get_by_id(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Order>>> {
    let order = OrderRepo::find_one(&state.pool, id).await?;
    auth_user.ensure_owner_or_admin(order.user_id)?;
    Ok(Json(DataResponse::new(order)))
}

/// POST /api/v1/orders
///
/// Places an order for the caller.
pub async fn create(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateOrder>,
) -> AppResult<(StatusCode, Json<DataResponse<Order>>)> {
    let order = OrderRepo::insert(&state.pool, auth_user.user_id, &input).await?;
    tracing::info!(order_id = order.id, user_id = auth_user.user_id, "Order placed");
    Ok((StatusCode::CREATED, Json(DataResponse::new(order))))
}

/// PATCH /api/v1/orders/{id}
pub async fn update(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateOrder>,
) -> AppResult<Json<DataResponse<Order>>> {
    let current = OrderRepo::find_one(&state.pool, id).await?;
    auth_user.ensure_owner_or_admin(current.user_id)?;

    if let Some(status) = input.status {
        validate_status_for_role(status, auth_user.is_admin())?;
    }

    let order = OrderRepo::update(&state.pool, id, &input).await?;
    tracing::info!(order_id = id, status = %order.status, "Order updated");
    Ok(Json(DataResponse::new(order)))
}
