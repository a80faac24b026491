//! Repository for the `categories` table.

use sqlx::PgPool;
use storefront_core::catalog::validate_category_titles;
use storefront_core::types::DbId;

use crate::error::DbError;
use crate::models::category::{Category, CategoryQuery, CreateCategory};

const COLUMNS: &str = "id, title";

/// Provides list, bulk insert, and delete for categories.
pub struct CategoryRepo;

impl CategoryRepo {
    /// List categories ordered by id, optionally filtered by a case-insensitive
    /// title substring.
    pub async fn list(pool: &PgPool, params: &CategoryQuery) -> Result<Vec<Category>, sqlx::Error> {
        match params.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            Some(title) => {
                let query = format!(
                    "SELECT {COLUMNS} FROM categories WHERE title ILIKE $1 ORDER BY id"
                );
                sqlx::query_as::<_, Category>(&query)
                    .bind(format!("%{title}%"))
                    .fetch_all(pool)
                    .await
            }
            None => {
                let query = format!("SELECT {COLUMNS} FROM categories ORDER BY id");
                sqlx::query_as::<_, Category>(&query).fetch_all(pool).await
            }
        }
    }

    /// Insert several categories in one transaction. Either all are written or
    /// none are.
    pub async fn insert_many(
        pool: &PgPool,
        inputs: &[CreateCategory],
    ) -> Result<Vec<Category>, DbError> {
        let titles: Vec<String> = inputs.iter().map(|c| c.title.trim().to_string()).collect();
        validate_category_titles(&titles)?;

        let mut tx = pool.begin().await?;
        let query = format!("INSERT INTO categories (title) VALUES ($1) RETURNING {COLUMNS}");
        let mut created = Vec::with_capacity(titles.len());
        for title in &titles {
            let category = sqlx::query_as::<_, Category>(&query)
                .bind(title)
                .fetch_one(&mut *tx)
                .await?;
            created.push(category);
        }
        tx.commit().await?;
        Ok(created)
    }

    /// Delete a category. Fails with `RowNotFound` when the id is unknown.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }
        Ok(())
    }
}
