//! Postgres persistence for the storefront.
//!
//! Layout:
//! - [`query`] composes parameterized list/count statements from filters.
//! - [`hydrate`] decodes aggregate JSON documents into typed entities.
//! - [`tx`] runs ordered write steps inside a single transaction.
//! - [`repositories`] builds the catalog, order, and account operations on top.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;

pub mod error;
pub mod hydrate;
pub mod models;
pub mod query;
pub mod repositories;
pub mod tx;

pub use error::DbError;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to verify the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await
        .map(|_| ())
}

/// Apply pending migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}
