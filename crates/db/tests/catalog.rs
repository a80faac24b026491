//! Integration tests for category and product persistence.
//!
//! Covers the product aggregate (category link + images), list/count
//! consistency, partial updates, image replacement, and atomicity of the
//! multi-step writes.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use async_trait::async_trait;
use sqlx::PgPool;
use storefront_core::catalog::{ProductFilter, ProductListParams};
use storefront_core::error::CoreError;
use storefront_core::storage::{ObjectStorage, StoredObject, UploadRequest};
use storefront_db::error::DbError;
use storefront_db::models::category::{CategoryQuery, CategoryRef, CreateCategory};
use storefront_db::models::image::NewImage;
use storefront_db::models::product::{CreateProduct, UpdateProduct};
use storefront_db::repositories::{CategoryRepo, ProductRepo};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

#[derive(Default)]
struct RecordingStorage {
    deleted: Mutex<Vec<String>>,
    fail_deletes: bool,
}

#[async_trait]
impl ObjectStorage for RecordingStorage {
    async fn upload(&self, _files: Vec<UploadRequest>) -> Result<Vec<StoredObject>, CoreError> {
        Ok(Vec::new())
    }

    async fn delete(&self, destinations: Vec<String>) -> Result<(), CoreError> {
        self.deleted.lock().unwrap().extend(destinations);
        if self.fail_deletes {
            return Err(CoreError::Internal("storage offline".into()));
        }
        Ok(())
    }
}

async fn seed_category(pool: &PgPool, title: &str) -> i64 {
    CategoryRepo::insert_many(
        pool,
        &[CreateCategory {
            title: title.to_string(),
        }],
    )
    .await
    .unwrap()[0]
        .id
}

fn new_product(title: &str, price: f64, category_id: Option<i64>) -> CreateProduct {
    CreateProduct {
        title: title.to_string(),
        description: format!("{title} description"),
        price,
        category: category_id.map(|id| CategoryRef { id }),
        images: Vec::new(),
    }
}

fn image(name: &str) -> NewImage {
    NewImage {
        filename: name.to_string(),
        url: format!("http://localhost:3000/static/images/products/{name}"),
    }
}

async fn count_rows(pool: &PgPool, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap()
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_category_bulk_insert_and_filter(pool: PgPool) {
    let created = CategoryRepo::insert_many(
        &pool,
        &[
            CreateCategory { title: "Kitchen".into() },
            CreateCategory { title: "Garden".into() },
        ],
    )
    .await
    .unwrap();
    assert_eq!(created.len(), 2);

    let filtered = CategoryRepo::list(
        &pool,
        &CategoryQuery {
            title: Some("kit".into()),
        },
    )
    .await
    .unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].title, "Kitchen");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_category_bulk_insert_is_all_or_nothing(pool: PgPool) {
    seed_category(&pool, "Kitchen").await;

    let result = CategoryRepo::insert_many(
        &pool,
        &[
            CreateCategory { title: "Garden".into() },
            CreateCategory { title: "Kitchen".into() },
        ],
    )
    .await;
    assert_matches!(result, Err(DbError::Database(_)));
    assert_eq!(count_rows(&pool, "categories").await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_empty_category_list_is_rejected(pool: PgPool) {
    let result = CategoryRepo::insert_many(&pool, &[]).await;
    assert_matches!(result, Err(DbError::Core(CoreError::Validation(_))));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_missing_category_is_not_found(pool: PgPool) {
    let result = CategoryRepo::delete(&pool, 999).await;
    assert_matches!(result, Err(sqlx::Error::RowNotFound));
}

// ---------------------------------------------------------------------------
// Product insert and read
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_insert_mug_returns_hydrated_product(pool: PgPool) {
    let category_id = seed_category(&pool, "Kitchen").await;

    let product = ProductRepo::insert(&pool, &new_product("Mug", 9.5, Some(category_id)))
        .await
        .unwrap();

    assert!(product.id > 0);
    assert_eq!(product.title, "Mug");
    assert_eq!(product.price, 9.5);
    assert!(product.images.is_empty());
    assert_eq!(product.category.as_ref().map(|c| c.id), Some(category_id));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_insert_with_images_round_trips_all_images(pool: PgPool) {
    let category_id = seed_category(&pool, "Kitchen").await;
    let mut input = new_product("Teapot", 25.0, Some(category_id));
    input.images = vec![image("a.png"), image("b.jpg"), image("c.jpeg")];

    let inserted = ProductRepo::insert(&pool, &input).await.unwrap();
    let fetched = ProductRepo::find_one(&pool, inserted.id).await.unwrap();

    assert_eq!(fetched.images.len(), 3);
    assert!(fetched.images.iter().all(|i| i.id > 0 && i.product_id == inserted.id));
    let names: Vec<&str> = fetched.images.iter().map(|i| i.filename.as_str()).collect();
    assert_eq!(names, vec!["a.png", "b.jpg", "c.jpeg"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_insert_without_category_writes_nothing(pool: PgPool) {
    let result = ProductRepo::insert(&pool, &new_product("Orphan", 1.0, None)).await;
    assert_matches!(result, Err(DbError::Core(CoreError::Validation(msg))) if msg == "category id is invalid");

    let result = ProductRepo::insert(&pool, &new_product("Orphan", 1.0, Some(0))).await;
    assert_matches!(result, Err(DbError::Core(CoreError::Validation(_))));

    assert_eq!(count_rows(&pool, "products").await, 0);
    assert_eq!(count_rows(&pool, "products_categories").await, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_failed_category_link_rolls_back_product_row(pool: PgPool) {
    // Category 404 does not exist, so the link step violates its foreign key
    // after the product row was already written.
    let result = ProductRepo::insert(&pool, &new_product("Ghost", 3.0, Some(404))).await;

    let err = result.unwrap_err();
    assert_matches!(&err, DbError::Write(_));
    assert!(err.to_string().contains("link_product_category"));
    assert_eq!(count_rows(&pool, "products").await, 0);
    assert_eq!(count_rows(&pool, "images").await, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_find_one_missing_is_not_found(pool: PgPool) {
    let err = ProductRepo::find_one(&pool, 12345).await.unwrap_err();
    assert!(err.is_not_found());
}

// ---------------------------------------------------------------------------
// Product listing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_search_mug_finds_single_match(pool: PgPool) {
    let category_id = seed_category(&pool, "Kitchen").await;
    for (title, price) in [("Coffee Mug", 9.5), ("Plate", 4.0), ("Bowl", 6.0)] {
        let mut input = new_product(title, price, Some(category_id));
        input.description = String::new();
        ProductRepo::insert(&pool, &input).await.unwrap();
    }

    let filter = ProductFilter::from(&ProductListParams {
        search: Some("mug".into()),
        page: Some(1),
        limit: Some(5),
        ..Default::default()
    });
    let (products, total) = ProductRepo::find(&pool, &filter).await.unwrap();

    assert_eq!(products.len(), 1);
    assert_eq!(total, 1);
    assert_eq!(filter.window.total_pages(total), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_pages_cover_every_row_once_with_duplicate_titles(pool: PgPool) {
    let category_id = seed_category(&pool, "Kitchen").await;
    let mut ids = Vec::new();
    for n in 0..12 {
        let title = if n % 3 == 0 { "Red cup" } else { "Blue cup" };
        let product = ProductRepo::insert(&pool, &new_product(title, n as f64, Some(category_id)))
            .await
            .unwrap();
        ids.push(product.id);
    }

    // Rewriting rows moves them on the heap, so equal titles come back in a
    // different physical order than they were inserted.
    let storage: Arc<dyn ObjectStorage> = Arc::new(RecordingStorage::default());
    for (n, id) in ids.iter().enumerate().step_by(2) {
        let title = if n % 3 == 0 { "Red cup" } else { "Blue cup" };
        ProductRepo::update(
            &pool,
            storage.clone(),
            *id,
            &UpdateProduct {
                title: Some(title.into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    }

    for search in [None, Some("red"), Some("blue"), Some("nothing")] {
        for sort in ["asc", "desc"] {
            let mut page = 1;
            let mut seen = 0usize;
            let mut distinct = HashSet::new();
            let total = loop {
                let filter = ProductFilter::from(&ProductListParams {
                    search: search.map(str::to_string),
                    page: Some(page),
                    limit: Some(5),
                    order_by: Some("title".into()),
                    sort: Some(sort.into()),
                    ..Default::default()
                });
                let (items, total) = ProductRepo::find(&pool, &filter).await.unwrap();
                seen += items.len();
                distinct.extend(items.iter().map(|p| p.id));
                if items.is_empty() || page >= filter.window.total_pages(total) {
                    break total;
                }
                page += 1;
            };
            assert_eq!(seen as i64, total, "search {search:?} {sort}");
            assert_eq!(distinct.len() as i64, total, "search {search:?} {sort}");
        }
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unknown_sort_falls_back_to_title_ascending(pool: PgPool) {
    let category_id = seed_category(&pool, "Kitchen").await;
    for (title, price) in [("Cup", 3.0), ("Apron", 12.0), ("Bowl", 6.0)] {
        ProductRepo::insert(&pool, &new_product(title, price, Some(category_id)))
            .await
            .unwrap();
    }

    let filter = ProductFilter::from(&ProductListParams {
        order_by: Some("colour".into()),
        sort: Some("sideways".into()),
        ..Default::default()
    });
    let (products, _) = ProductRepo::find(&pool, &filter).await.unwrap();
    let titles: Vec<&str> = products.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["Apron", "Bowl", "Cup"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_sort_by_price_descending(pool: PgPool) {
    let category_id = seed_category(&pool, "Kitchen").await;
    for (title, price) in [("Cup", 3.0), ("Apron", 12.0), ("Bowl", 6.0)] {
        ProductRepo::insert(&pool, &new_product(title, price, Some(category_id)))
            .await
            .unwrap();
    }

    let filter = ProductFilter::from(&ProductListParams {
        order_by: Some("price".into()),
        sort: Some("DESC".into()),
        ..Default::default()
    });
    let (products, total) = ProductRepo::find(&pool, &filter).await.unwrap();
    let prices: Vec<f64> = products.iter().map(|p| p.price).collect();
    assert_eq!(prices, vec![12.0, 6.0, 3.0]);
    assert_eq!(total, 3);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_empty_catalog_lists_nothing(pool: PgPool) {
    let (products, total) = ProductRepo::find(&pool, &ProductFilter::default()).await.unwrap();
    assert!(products.is_empty());
    assert_eq!(total, 0);
}

// ---------------------------------------------------------------------------
// Product update and delete
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_price_update_never_applies(pool: PgPool) {
    let category_id = seed_category(&pool, "Kitchen").await;
    let product = ProductRepo::insert(&pool, &new_product("Mug", 9.5, Some(category_id)))
        .await
        .unwrap();
    let storage: Arc<dyn ObjectStorage> = Arc::new(RecordingStorage::default());

    for price in [0.0, 12.0, -1.0] {
        let updated = ProductRepo::update(
            &pool,
            storage.clone(),
            product.id,
            &UpdateProduct {
                price: Some(price),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.price, 9.5, "price {price} must not be written");
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_partial_update_only_touches_supplied_fields(pool: PgPool) {
    let kitchen = seed_category(&pool, "Kitchen").await;
    let garden = seed_category(&pool, "Garden").await;
    let product = ProductRepo::insert(&pool, &new_product("Mug", 9.5, Some(kitchen)))
        .await
        .unwrap();
    let storage: Arc<dyn ObjectStorage> = Arc::new(RecordingStorage::default());

    let updated = ProductRepo::update(
        &pool,
        storage,
        product.id,
        &UpdateProduct {
            title: Some("Big Mug".into()),
            description: Some(String::new()),
            category: Some(CategoryRef { id: garden }),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(updated.title, "Big Mug");
    assert_eq!(updated.description, product.description);
    assert_eq!(updated.category.map(|c| c.id), Some(garden));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_image_replacement_deletes_old_objects_best_effort(pool: PgPool) {
    let category_id = seed_category(&pool, "Kitchen").await;
    let mut input = new_product("Vase", 30.0, Some(category_id));
    input.images = vec![image("old-1.png"), image("old-2.png")];
    let product = ProductRepo::insert(&pool, &input).await.unwrap();

    let storage = Arc::new(RecordingStorage {
        fail_deletes: true,
        ..Default::default()
    });
    let updated = ProductRepo::update(
        &pool,
        storage.clone(),
        product.id,
        &UpdateProduct {
            images: vec![image("new.png")],
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(updated.images.len(), 1);
    assert_eq!(updated.images[0].filename, "new.png");
    assert_eq!(
        *storage.deleted.lock().unwrap(),
        vec![
            "images/products/old-1.png".to_string(),
            "images/products/old-2.png".to_string()
        ]
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_without_images_keeps_existing_images(pool: PgPool) {
    let category_id = seed_category(&pool, "Kitchen").await;
    let mut input = new_product("Vase", 30.0, Some(category_id));
    input.images = vec![image("keep.png")];
    let product = ProductRepo::insert(&pool, &input).await.unwrap();
    let storage = Arc::new(RecordingStorage::default());

    let updated = ProductRepo::update(
        &pool,
        storage.clone(),
        product.id,
        &UpdateProduct {
            title: Some("Tall Vase".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(updated.images.len(), 1);
    assert!(storage.deleted.lock().unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_missing_product_is_not_found(pool: PgPool) {
    let storage: Arc<dyn ObjectStorage> = Arc::new(RecordingStorage::default());
    let err = ProductRepo::update(
        &pool,
        storage,
        777,
        &UpdateProduct {
            title: Some("Nope".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(err.is_not_found());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_cascades_to_link_and_images(pool: PgPool) {
    let category_id = seed_category(&pool, "Kitchen").await;
    let mut input = new_product("Vase", 30.0, Some(category_id));
    input.images = vec![image("a.png")];
    let product = ProductRepo::insert(&pool, &input).await.unwrap();

    assert_eq!(
        ProductRepo::image_filenames(&pool, product.id).await.unwrap(),
        vec!["a.png".to_string()]
    );
    ProductRepo::delete(&pool, product.id).await.unwrap();

    assert_eq!(count_rows(&pool, "products").await, 0);
    assert_eq!(count_rows(&pool, "products_categories").await, 0);
    assert_eq!(count_rows(&pool, "images").await, 0);
    assert!(ProductRepo::delete(&pool, product.id).await.unwrap_err().is_not_found());
}
