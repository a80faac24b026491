use std::sync::Arc;

use storefront_core::storage::ObjectStorage;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: the pool is reference-counted and everything else sits
/// behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub pool: storefront_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Object store for product images and transfer slips.
    pub storage: Arc<dyn ObjectStorage>,
}
