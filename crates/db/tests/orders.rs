//! Integration tests for order persistence: snapshot lines, totals,
//! atomicity of the insert sequence, filtering, and order-level updates.

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgConnection, PgPool};
use storefront_core::error::CoreError;
use storefront_core::order::{OrderFilter, OrderListParams, OrderStatus};
use storefront_core::roles::ROLE_ID_CUSTOMER;
use storefront_db::error::{DbError, WriteError};
use storefront_db::models::category::{CategoryRef, CreateCategory};
use storefront_db::models::order::{CreateOrder, CreateOrderLine, TransferSlipInput, UpdateOrder};
use storefront_db::models::product::CreateProduct;
use storefront_db::models::user::CreateUser;
use storefront_db::repositories::order_repo::{InsertOrderLines, InsertOrderRow, OrderInsert};
use storefront_db::repositories::{CategoryRepo, OrderRepo, ProductRepo, UserRepo};
use storefront_db::tx::{WriteCoordinator, WriteStep};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed_user(pool: &PgPool, name: &str) -> i64 {
    UserRepo::create(
        pool,
        &CreateUser {
            username: name.to_string(),
            email: format!("{name}@example.com"),
            password_hash: "not-a-real-hash".to_string(),
            role_id: ROLE_ID_CUSTOMER,
        },
    )
    .await
    .unwrap()
    .id
}

async fn seed_product(pool: &PgPool, title: &str, price: f64) -> i64 {
    let categories = CategoryRepo::insert_many(
        pool,
        &[CreateCategory {
            title: format!("{title} category"),
        }],
    )
    .await
    .unwrap();
    ProductRepo::insert(
        pool,
        &CreateProduct {
            title: title.to_string(),
            description: String::new(),
            price,
            category: Some(CategoryRef {
                id: categories[0].id,
            }),
            images: Vec::new(),
        },
    )
    .await
    .unwrap()
    .id
}

fn new_order(lines: &[(i64, i32)]) -> CreateOrder {
    CreateOrder {
        address: "12 Harbour Road".to_string(),
        contact: "555-0100".to_string(),
        products: lines
            .iter()
            .map(|(product_id, qty)| CreateOrderLine {
                product_id: *product_id,
                qty: *qty,
            })
            .collect(),
    }
}

async fn count_rows(pool: &PgPool, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap()
}

/// Step that always fails, used to interrupt an insert sequence.
struct FailingStep;

#[async_trait]
impl WriteStep<OrderInsert> for FailingStep {
    fn name(&self) -> &'static str {
        "injected_failure"
    }

    async fn execute(&self, _conn: &mut PgConnection, _ctx: &mut OrderInsert) -> Result<(), sqlx::Error> {
        Err(sqlx::Error::Protocol("injected".into()))
    }
}

// ---------------------------------------------------------------------------
// Insert
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_insert_order_totals_lines(pool: PgPool) {
    let user_id = seed_user(&pool, "alice").await;
    let mug = seed_product(&pool, "Mug", 9.5).await;
    let lamp = seed_product(&pool, "Lamp", 20.0).await;

    let order = OrderRepo::insert(&pool, user_id, &new_order(&[(mug, 2), (lamp, 1)]))
        .await
        .unwrap();

    assert_eq!(order.total_paid, 39.0);
    assert_eq!(order.products.len(), 2);
    assert_eq!(order.status, OrderStatus::Waiting);
    assert_eq!(order.user_id, user_id);
    assert_eq!(order.products[0].product.id, mug);
    assert_eq!(order.products[0].qty, 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_snapshot_survives_catalog_price_change(pool: PgPool) {
    let user_id = seed_user(&pool, "bob").await;
    let mug = seed_product(&pool, "Mug", 9.5).await;
    let order = OrderRepo::insert(&pool, user_id, &new_order(&[(mug, 2)]))
        .await
        .unwrap();

    sqlx::query("UPDATE products SET price = 99.0, title = 'Gold Mug' WHERE id = $1")
        .bind(mug)
        .execute(&pool)
        .await
        .unwrap();

    let reread = OrderRepo::find_one(&pool, order.id).await.unwrap();
    assert_eq!(reread.total_paid, 19.0);
    assert_eq!(reread.products[0].product.price, 9.5);
    assert_eq!(reread.products[0].product.title, "Mug");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_order_without_lines_is_rejected(pool: PgPool) {
    let user_id = seed_user(&pool, "carol").await;
    let result = OrderRepo::insert(&pool, user_id, &new_order(&[])).await;
    assert_matches!(result, Err(DbError::Core(CoreError::Validation(_))));
    assert_eq!(count_rows(&pool, "orders").await, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_order_with_zero_quantity_is_rejected(pool: PgPool) {
    let user_id = seed_user(&pool, "dave").await;
    let mug = seed_product(&pool, "Mug", 9.5).await;
    let result = OrderRepo::insert(&pool, user_id, &new_order(&[(mug, 0)])).await;
    assert_matches!(result, Err(DbError::Core(CoreError::Validation(_))));
    assert_eq!(count_rows(&pool, "orders").await, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_order_with_unknown_product_is_rejected(pool: PgPool) {
    let user_id = seed_user(&pool, "erin").await;
    let mug = seed_product(&pool, "Mug", 9.5).await;
    let result = OrderRepo::insert(&pool, user_id, &new_order(&[(mug, 1), (4040, 1)])).await;
    assert_matches!(result, Err(DbError::Core(CoreError::Validation(msg))) if msg.contains("4040"));
    assert_eq!(count_rows(&pool, "orders").await, 0);
    assert_eq!(count_rows(&pool, "products_orders").await, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_failure_between_order_and_lines_leaves_no_rows(pool: PgPool) {
    let user_id = seed_user(&pool, "frank").await;
    let mug = seed_product(&pool, "Mug", 9.5).await;
    let mut ctx = OrderRepo::prepare_insert(&pool, user_id, &new_order(&[(mug, 1)]))
        .await
        .unwrap();

    let coordinator = WriteCoordinator::new("order_insert")
        .step(InsertOrderRow)
        .step(FailingStep)
        .step(InsertOrderLines);
    let err = coordinator.run(&pool, &mut ctx).await.unwrap_err();

    assert_matches!(
        err,
        WriteError::Step {
            step: "injected_failure",
            ..
        }
    );
    assert!(ctx.order_id.is_some(), "parent row was written before the failure");
    assert_eq!(count_rows(&pool, "orders").await, 0);
    assert_eq!(count_rows(&pool, "products_orders").await, 0);
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_find_orders_filters_and_counts(pool: PgPool) {
    let user_id = seed_user(&pool, "gina").await;
    let mug = seed_product(&pool, "Mug", 9.5).await;

    let mut ids = Vec::new();
    for address in ["1 Oak Lane", "2 Pine Street", "3 Oak Avenue"] {
        let mut input = new_order(&[(mug, 1)]);
        input.address = address.to_string();
        ids.push(OrderRepo::insert(&pool, user_id, &input).await.unwrap().id);
    }
    OrderRepo::update(
        &pool,
        ids[2],
        &UpdateOrder {
            status: Some(OrderStatus::Shipping),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let filter = OrderFilter::from_params(&OrderListParams {
        search: Some("OAK".into()),
        ..Default::default()
    })
    .unwrap();
    let (orders, total) = OrderRepo::find(&pool, &filter).await.unwrap();
    assert_eq!(total, 2);
    // Default sort is id descending.
    assert_eq!(orders.iter().map(|o| o.id).collect::<Vec<_>>(), vec![ids[2], ids[0]]);

    let filter = OrderFilter::from_params(&OrderListParams {
        status: Some("shipping".into()),
        ..Default::default()
    })
    .unwrap();
    let (orders, total) = OrderRepo::find(&pool, &filter).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(orders[0].id, ids[2]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_find_orders_by_inclusive_date_range(pool: PgPool) {
    let user_id = seed_user(&pool, "hank").await;
    let mug = seed_product(&pool, "Mug", 9.5).await;
    let order = OrderRepo::insert(&pool, user_id, &new_order(&[(mug, 1)]))
        .await
        .unwrap();
    sqlx::query("UPDATE orders SET created_at = '2026-03-15T12:00:00Z' WHERE id = $1")
        .bind(order.id)
        .execute(&pool)
        .await
        .unwrap();

    let within = |start: &str, end: &str| OrderListParams {
        start_date: Some(start.to_string()),
        end_date: Some(end.to_string()),
        ..Default::default()
    };

    let filter = OrderFilter::from_params(&within("2026-03-15", "2026-03-15")).unwrap();
    let (_, total) = OrderRepo::find(&pool, &filter).await.unwrap();
    assert_eq!(total, 1);

    let filter = OrderFilter::from_params(&within("2026-03-16", "2026-04-01")).unwrap();
    let (orders, total) = OrderRepo::find(&pool, &filter).await.unwrap();
    assert_eq!(total, 0);
    assert!(orders.is_empty());
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_attach_transfer_slip_generates_id_and_timestamp(pool: PgPool) {
    let user_id = seed_user(&pool, "ivy").await;
    let mug = seed_product(&pool, "Mug", 9.5).await;
    let order = OrderRepo::insert(&pool, user_id, &new_order(&[(mug, 1)]))
        .await
        .unwrap();
    let before = Utc::now();

    let updated = OrderRepo::update(
        &pool,
        order.id,
        &UpdateOrder {
            status: None,
            transfer_slip: Some(TransferSlipInput {
                id: None,
                filename: "slip.png".into(),
                url: "http://localhost:3000/static/slips/slip.png".into(),
                created_at: None,
            }),
        },
    )
    .await
    .unwrap();

    let slip = updated.transfer_slip.expect("slip attached");
    assert!(uuid::Uuid::parse_str(&slip.id).is_ok());
    assert!(slip.created_at >= before - chrono::Duration::seconds(5));
    assert_eq!(updated.status, OrderStatus::Waiting);
    assert_eq!(updated.products, order.products);
    assert_eq!(updated.total_paid, order.total_paid);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_missing_order_is_not_found(pool: PgPool) {
    let err = OrderRepo::update(
        &pool,
        999,
        &UpdateOrder {
            status: Some(OrderStatus::Canceled),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(err.is_not_found());
}
