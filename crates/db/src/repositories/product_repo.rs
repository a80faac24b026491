//! Repository for products, their category link, and their images.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use storefront_core::catalog::{price_update_applies, validate_new_product, ProductFilter};
use storefront_core::storage::{product_image_destination, ObjectStorage};
use storefront_core::types::DbId;

use crate::error::DbError;
use crate::hydrate::hydrate_many;
use crate::models::image::NewImage;
use crate::models::product::{CreateProduct, Product, UpdateProduct};
use crate::query::{bind_values, compose_count, compose_fetch, BindValue, Predicate};
use crate::tx::{assigned_id, WriteCoordinator, WriteStep};

// ---------------------------------------------------------------------------
// Aggregate document
// ---------------------------------------------------------------------------

/// One row per product with its category and images nested as JSON.
const PRODUCT_DOCUMENT: &str = "\
    SELECT p.id, p.title, p.description, p.price, \
        (SELECT jsonb_build_object('id', c.id, 'title', c.title) \
           FROM products_categories AS pc \
           JOIN categories AS c ON c.id = pc.category_id \
          WHERE pc.product_id = p.id) AS category, \
        COALESCE((SELECT json_agg(json_build_object(\
                    'id', i.id, 'filename', i.filename, 'url', i.url, 'product_id', i.product_id) \
                    ORDER BY i.id) \
                    FROM images AS i \
                   WHERE i.product_id = p.id), '[]'::json) AS images, \
        p.created_at, p.updated_at \
    FROM products AS p";

const PRODUCT_COUNT: &str = "SELECT COUNT(*)::BIGINT FROM products AS p";

const ID_COLUMN: &str = "\"p\".\"id\"";
const SEARCH_COLUMNS: &[&str] = &["\"p\".\"title\"", "\"p\".\"description\""];

fn product_predicates(filter: &ProductFilter) -> Vec<Predicate> {
    let mut predicates = Vec::new();
    if let Some(id) = filter.id {
        predicates.push(Predicate::Eq {
            column: ID_COLUMN,
            value: BindValue::BigInt(id),
        });
    }
    if let Some(ref term) = filter.search {
        predicates.push(Predicate::ContainsAny {
            columns: SEARCH_COLUMNS,
            term: term.clone(),
        });
    }
    predicates
}

// ---------------------------------------------------------------------------
// ProductRepo
// ---------------------------------------------------------------------------

/// Catalog persistence: product reads and multi-table writes.
pub struct ProductRepo;

impl ProductRepo {
    /// Fetch one product with its category and images.
    ///
    /// Returns `sqlx::Error::RowNotFound` (wrapped) when no product matches.
    pub async fn find_one(pool: &PgPool, id: DbId) -> Result<Product, DbError> {
        let filter = ProductFilter {
            id: Some(id),
            ..Default::default()
        };
        let (products, _) = Self::fetch_page(pool, &filter, false).await?;
        products
            .into_iter()
            .next()
            .ok_or(DbError::Database(sqlx::Error::RowNotFound))
    }

    /// Fetch one page of products plus the total number matching the filter.
    pub async fn find(pool: &PgPool, filter: &ProductFilter) -> Result<(Vec<Product>, i64), DbError> {
        Self::fetch_page(pool, filter, true).await
    }

    async fn fetch_page(
        pool: &PgPool,
        filter: &ProductFilter,
        with_count: bool,
    ) -> Result<(Vec<Product>, i64), DbError> {
        let predicates = product_predicates(filter);

        let fetch = compose_fetch(PRODUCT_DOCUMENT, &predicates, &filter.sort, &filter.window)?;
        let raw = bind_values(
            sqlx::query_scalar::<_, Option<serde_json::Value>>(&fetch.sql),
            &fetch.values,
        )
        .fetch_one(pool)
        .await?;
        let products: Vec<Product> = hydrate_many("products", raw)?;

        if !with_count {
            let total = products.len() as i64;
            return Ok((products, total));
        }

        let count = compose_count(PRODUCT_COUNT, &predicates)?;
        let total = bind_values(sqlx::query_scalar::<_, i64>(&count.sql), &count.values)
            .fetch_one(pool)
            .await?;
        Ok((products, total))
    }

    /// Insert a product, its category link, and its images atomically, then
    /// re-read it.
    pub async fn insert(pool: &PgPool, input: &CreateProduct) -> Result<Product, DbError> {
        validate_new_product(&input.title, input.price, input.category_id())?;

        let mut ctx = ProductInsert {
            input: input.clone(),
            product_id: None,
        };
        Self::insert_coordinator().run(pool, &mut ctx).await?;

        let id = ctx.product_id.ok_or(DbError::Database(sqlx::Error::RowNotFound))?;
        tracing::debug!(product_id = id, images = input.images.len(), "Product inserted");
        Self::find_one(pool, id).await
    }

    /// Step sequence for product inserts.
    pub fn insert_coordinator() -> WriteCoordinator<ProductInsert> {
        WriteCoordinator::new("product_insert")
            .step(InsertProductRow)
            .step(LinkProductCategory)
            .step(InsertProductImages)
    }

    /// Apply a partial update and re-read the product.
    ///
    /// Supplied images replace the existing set. Old image objects are
    /// removed from `storage` on a best-effort basis.
    pub async fn update(
        pool: &PgPool,
        storage: Arc<dyn ObjectStorage>,
        id: DbId,
        input: &UpdateProduct,
    ) -> Result<Product, DbError> {
        let mut ctx = ProductUpdate {
            id,
            input: input.clone(),
        };
        WriteCoordinator::new("product_update")
            .step(UpdateProductRow)
            .step(UpdateProductCategory)
            .step(ReplaceProductImages { storage })
            .run(pool, &mut ctx)
            .await?;

        Self::find_one(pool, id).await
    }

    /// Filenames of a product's images, for object-storage cleanup.
    pub async fn image_filenames(pool: &PgPool, id: DbId) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT filename FROM images WHERE product_id = $1 ORDER BY id",
        )
        .bind(id)
        .fetch_all(pool)
        .await
    }

    /// Hard-delete a product. Its link row and images cascade.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::Database(sqlx::Error::RowNotFound));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Insert steps
// ---------------------------------------------------------------------------

/// Shared state for a product insert run.
pub struct ProductInsert {
    pub input: CreateProduct,
    pub product_id: Option<DbId>,
}

/// Writes the `products` row and records its generated id.
pub struct InsertProductRow;

#[async_trait]
impl WriteStep<ProductInsert> for InsertProductRow {
    fn name(&self) -> &'static str {
        "insert_product_row"
    }

    async fn execute(&self, conn: &mut PgConnection, ctx: &mut ProductInsert) -> Result<(), sqlx::Error> {
        let id = sqlx::query_scalar::<_, DbId>(
            "INSERT INTO products (title, description, price) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(ctx.input.title.trim())
        .bind(&ctx.input.description)
        .bind(ctx.input.price)
        .fetch_one(&mut *conn)
        .await?;
        ctx.product_id = Some(id);
        Ok(())
    }
}

/// Writes the `products_categories` link row.
pub struct LinkProductCategory;

#[async_trait]
impl WriteStep<ProductInsert> for LinkProductCategory {
    fn name(&self) -> &'static str {
        "link_product_category"
    }

    async fn execute(&self, conn: &mut PgConnection, ctx: &mut ProductInsert) -> Result<(), sqlx::Error> {
        let product_id = assigned_id(ctx.product_id, "product")?;
        sqlx::query("INSERT INTO products_categories (product_id, category_id) VALUES ($1, $2)")
            .bind(product_id)
            .bind(ctx.input.category_id())
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}

/// Writes one `images` row per supplied image.
pub struct InsertProductImages;

#[async_trait]
impl WriteStep<ProductInsert> for InsertProductImages {
    fn name(&self) -> &'static str {
        "insert_product_images"
    }

    async fn execute(&self, conn: &mut PgConnection, ctx: &mut ProductInsert) -> Result<(), sqlx::Error> {
        let product_id = assigned_id(ctx.product_id, "product")?;
        insert_images(conn, product_id, &ctx.input.images).await
    }
}

// ---------------------------------------------------------------------------
// Update steps
// ---------------------------------------------------------------------------

/// Shared state for a product update run.
pub struct ProductUpdate {
    pub id: DbId,
    pub input: UpdateProduct,
}

/// Patches non-empty scalar fields. Fails with `RowNotFound` for a missing id.
pub struct UpdateProductRow;

#[async_trait]
impl WriteStep<ProductUpdate> for UpdateProductRow {
    fn name(&self) -> &'static str {
        "update_product_row"
    }

    async fn execute(&self, conn: &mut PgConnection, ctx: &mut ProductUpdate) -> Result<(), sqlx::Error> {
        let title = non_empty(ctx.input.title.as_deref());
        let description = non_empty(ctx.input.description.as_deref());
        let price = ctx.input.price.filter(|p| price_update_applies(*p));

        let result = sqlx::query(
            "UPDATE products SET \
                title = COALESCE($2, title), \
                description = COALESCE($3, description), \
                price = COALESCE($4, price), \
                updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(ctx.id)
        .bind(title)
        .bind(description)
        .bind(price)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }
        Ok(())
    }
}

/// Re-points the category link when a positive category id is supplied.
pub struct UpdateProductCategory;

#[async_trait]
impl WriteStep<ProductUpdate> for UpdateProductCategory {
    fn name(&self) -> &'static str {
        "update_product_category"
    }

    async fn execute(&self, conn: &mut PgConnection, ctx: &mut ProductUpdate) -> Result<(), sqlx::Error> {
        let Some(category_id) = ctx.input.category.map(|c| c.id).filter(|id| *id > 0) else {
            return Ok(());
        };
        sqlx::query(
            "INSERT INTO products_categories (product_id, category_id) VALUES ($1, $2) \
             ON CONFLICT (product_id) DO UPDATE SET category_id = EXCLUDED.category_id",
        )
        .bind(ctx.id)
        .bind(category_id)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }
}

/// Replaces the whole image set when new images are supplied.
///
/// The old objects are deleted from storage first. That delete is best-effort:
/// a failure is logged and the database work continues.
pub struct ReplaceProductImages {
    pub storage: Arc<dyn ObjectStorage>,
}

#[async_trait]
impl WriteStep<ProductUpdate> for ReplaceProductImages {
    fn name(&self) -> &'static str {
        "replace_product_images"
    }

    async fn execute(&self, conn: &mut PgConnection, ctx: &mut ProductUpdate) -> Result<(), sqlx::Error> {
        if ctx.input.images.is_empty() {
            return Ok(());
        }

        let old_filenames = sqlx::query_scalar::<_, String>(
            "SELECT filename FROM images WHERE product_id = $1 ORDER BY id",
        )
        .bind(ctx.id)
        .fetch_all(&mut *conn)
        .await?;

        if !old_filenames.is_empty() {
            let destinations: Vec<String> = old_filenames
                .iter()
                .map(|f| product_image_destination(f))
                .collect();
            if let Err(e) = self.storage.delete(destinations).await {
                tracing::warn!(
                    product_id = ctx.id,
                    error = %e,
                    "Failed to delete old product images from storage; continuing"
                );
            }
        }

        sqlx::query("DELETE FROM images WHERE product_id = $1")
            .bind(ctx.id)
            .execute(&mut *conn)
            .await?;

        insert_images(conn, ctx.id, &ctx.input.images).await
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Multi-row INSERT of images for one product. No-op for an empty slice.
async fn insert_images(
    conn: &mut PgConnection,
    product_id: DbId,
    images: &[NewImage],
) -> Result<(), sqlx::Error> {
    if images.is_empty() {
        return Ok(());
    }

    let mut query = String::from("INSERT INTO images (filename, url, product_id) VALUES ");
    let mut param_idx = 1u32;
    for (n, _) in images.iter().enumerate() {
        if n > 0 {
            query.push_str(", ");
        }
        query.push_str(&format!(
            "(${}, ${}, ${})",
            param_idx,
            param_idx + 1,
            param_idx + 2
        ));
        param_idx += 3;
    }

    let mut q = sqlx::query(&query);
    for image in images {
        q = q.bind(&image.filename).bind(&image.url).bind(product_id);
    }
    q.execute(&mut *conn).await?;
    Ok(())
}
