//! Repository for orders and their line snapshots.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use storefront_core::error::CoreError;
use storefront_core::order::{total_paid, validate_order_lines, OrderFilter, OrderStatus};
use storefront_core::types::DbId;

use crate::error::DbError;
use crate::hydrate::hydrate_many;
use crate::models::order::{CreateOrder, Order, TransferSlip, UpdateOrder};
use crate::models::product::Product;
use crate::query::{bind_values, compose_count, compose_fetch, BindValue, Predicate};
use crate::repositories::ProductRepo;
use crate::tx::{assigned_id, WriteCoordinator, WriteStep};

// ---------------------------------------------------------------------------
// Aggregate document
// ---------------------------------------------------------------------------

/// One row per order with its lines nested as JSON. `total_paid` is summed
/// from the line snapshots, so later catalog edits never change it.
const ORDER_DOCUMENT: &str = "\
    SELECT o.id, o.user_id, o.transfer_slip, o.address, o.contact, o.status, \
        COALESCE((SELECT SUM((po.product->>'price')::DOUBLE PRECISION * po.qty) \
                    FROM products_orders AS po \
                   WHERE po.order_id = o.id), 0)::DOUBLE PRECISION AS total_paid, \
        COALESCE((SELECT json_agg(json_build_object(\
                    'id', po.id, 'order_id', po.order_id, 'qty', po.qty, 'product', po.product) \
                    ORDER BY po.id) \
                    FROM products_orders AS po \
                   WHERE po.order_id = o.id), '[]'::json) AS products, \
        o.created_at, o.updated_at \
    FROM orders AS o";

const ORDER_COUNT: &str = "SELECT COUNT(*)::BIGINT FROM orders AS o";

const ID_COLUMN: &str = "\"o\".\"id\"";
const STATUS_COLUMN: &str = "\"o\".\"status\"";
const CREATED_AT_COLUMN: &str = "\"o\".\"created_at\"";
const SEARCH_COLUMNS: &[&str] = &["\"o\".\"address\"", "\"o\".\"contact\""];

fn order_predicates(filter: &OrderFilter) -> Vec<Predicate> {
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
    if let Some(status) = filter.status {
        predicates.push(Predicate::Eq {
            column: STATUS_COLUMN,
            value: BindValue::Text(status.as_str().to_string()),
        });
    }
    if let Some(day) = filter.created.start {
        predicates.push(Predicate::OnOrAfter {
            column: CREATED_AT_COLUMN,
            day,
        });
    }
    if let Some(day) = filter.created.end {
        predicates.push(Predicate::OnOrBefore {
            column: CREATED_AT_COLUMN,
            day,
        });
    }
    predicates
}

// ---------------------------------------------------------------------------
// OrderRepo
// ---------------------------------------------------------------------------

/// Order persistence: reads, snapshot inserts, and order-level updates.
pub struct OrderRepo;

impl OrderRepo {
    /// Fetch one order with all lines.
    pub async fn find_one(pool: &PgPool, id: DbId) -> Result<Order, DbError> {
        let filter = OrderFilter {
            id: Some(id),
            ..Default::default()
        };
        let fetch = compose_fetch(ORDER_DOCUMENT, &order_predicates(&filter), &filter.sort, &filter.window)?;
        let raw = bind_values(
            sqlx::query_scalar::<_, Option<serde_json::Value>>(&fetch.sql),
            &fetch.values,
        )
        .fetch_one(pool)
        .await?;
        let orders: Vec<Order> = hydrate_many("order", raw)?;
        orders
            .into_iter()
            .next()
            .ok_or(DbError::Database(sqlx::Error::RowNotFound))
    }

    /// Fetch one page of orders plus the total number matching the filter.
    pub async fn find(pool: &PgPool, filter: &OrderFilter) -> Result<(Vec<Order>, i64), DbError> {
        let predicates = order_predicates(filter);

        let fetch = compose_fetch(ORDER_DOCUMENT, &predicates, &filter.sort, &filter.window)?;
        let raw = bind_values(
            sqlx::query_scalar::<_, Option<serde_json::Value>>(&fetch.sql),
            &fetch.values,
        )
        .fetch_one(pool)
        .await?;
        let orders: Vec<Order> = hydrate_many("orders", raw)?;

        let count = compose_count(ORDER_COUNT, &predicates)?;
        let total = bind_values(sqlx::query_scalar::<_, i64>(&count.sql), &count.values)
            .fetch_one(pool)
            .await?;
        Ok((orders, total))
    }

    /// Resolve every requested line against the current catalog.
    ///
    /// Fails with a validation error for an empty order, a non-positive
    /// quantity, or a product that does not exist. Performs no writes.
    pub async fn prepare_insert(
        pool: &PgPool,
        user_id: DbId,
        input: &CreateOrder,
    ) -> Result<OrderInsert, DbError> {
        let quantities: Vec<i32> = input.products.iter().map(|l| l.qty).collect();
        validate_order_lines(&quantities)?;

        let mut lines = Vec::with_capacity(input.products.len());
        for line in &input.products {
            let product = match ProductRepo::find_one(pool, line.product_id).await {
                Ok(product) => product,
                Err(e) if e.is_not_found() => {
                    return Err(CoreError::Validation(format!(
                        "Product {} does not exist",
                        line.product_id
                    ))
                    .into());
                }
                Err(e) => return Err(e),
            };
            lines.push((line.qty, product));
        }

        Ok(OrderInsert {
            user_id,
            address: input.address.clone(),
            contact: input.contact.clone(),
            total_paid: total_paid(lines.iter().map(|(qty, p)| (p.price, *qty))),
            lines,
            order_id: None,
        })
    }

    /// Place an order: snapshot the current products, write the order and its
    /// lines atomically, then re-read it.
    pub async fn insert(pool: &PgPool, user_id: DbId, input: &CreateOrder) -> Result<Order, DbError> {
        let mut ctx = Self::prepare_insert(pool, user_id, input).await?;
        Self::insert_coordinator().run(pool, &mut ctx).await?;

        let id = ctx.order_id.ok_or(DbError::Database(sqlx::Error::RowNotFound))?;
        tracing::debug!(order_id = id, user_id, total_paid = ctx.total_paid, "Order inserted");
        Self::find_one(pool, id).await
    }

    /// Step sequence for order inserts.
    pub fn insert_coordinator() -> WriteCoordinator<OrderInsert> {
        WriteCoordinator::new("order_insert")
            .step(InsertOrderRow)
            .step(InsertOrderLines)
    }

    /// Change status and/or attach a transfer slip. Lines are untouched.
    ///
    /// A slip without an id or timestamp gets a generated UUID and the current
    /// time.
    pub async fn update(pool: &PgPool, id: DbId, input: &UpdateOrder) -> Result<Order, DbError> {
        let slip = input.transfer_slip.as_ref().map(|slip| {
            Json(TransferSlip {
                id: slip
                    .id
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
                filename: slip.filename.clone(),
                url: slip.url.clone(),
                created_at: slip.created_at.unwrap_or_else(chrono::Utc::now),
            })
        });

        let result = sqlx::query(
            "UPDATE orders SET \
                status = COALESCE($2, status), \
                transfer_slip = COALESCE($3, transfer_slip), \
                updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(input.status.map(OrderStatus::as_str))
        .bind(slip)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::Database(sqlx::Error::RowNotFound));
        }
        Self::find_one(pool, id).await
    }
}

// ---------------------------------------------------------------------------
// Insert steps
// ---------------------------------------------------------------------------

/// Shared state for an order insert run.
pub struct OrderInsert {
    pub user_id: DbId,
    pub address: String,
    pub contact: String,
    /// `(qty, product snapshot)` per line, in request order.
    pub lines: Vec<(i32, Product)>,
    pub total_paid: f64,
    pub order_id: Option<DbId>,
}

/// Writes the `orders` row with status `waiting` and records its id.
pub struct InsertOrderRow;

#[async_trait]
impl WriteStep<OrderInsert> for InsertOrderRow {
    fn name(&self) -> &'static str {
        "insert_order_row"
    }

    async fn execute(&self, conn: &mut PgConnection, ctx: &mut OrderInsert) -> Result<(), sqlx::Error> {
        let id = sqlx::query_scalar::<_, DbId>(
            "INSERT INTO orders (user_id, address, contact, status) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(ctx.user_id)
        .bind(&ctx.address)
        .bind(&ctx.contact)
        .bind(OrderStatus::Waiting.as_str())
        .fetch_one(&mut *conn)
        .await?;
        ctx.order_id = Some(id);
        Ok(())
    }
}

/// Writes one `products_orders` row per line with the product snapshot.
pub struct InsertOrderLines;

#[async_trait]
impl WriteStep<OrderInsert> for InsertOrderLines {
    fn name(&self) -> &'static str {
        "insert_order_lines"
    }

    async fn execute(&self, conn: &mut PgConnection, ctx: &mut OrderInsert) -> Result<(), sqlx::Error> {
        let order_id = assigned_id(ctx.order_id, "order")?;
        if ctx.lines.is_empty() {
            return Ok(());
        }

        let mut query = String::from("INSERT INTO products_orders (order_id, qty, product) VALUES ");
        let mut param_idx = 1u32;
        for (n, _) in ctx.lines.iter().enumerate() {
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
        for (qty, product) in &ctx.lines {
            q = q.bind(order_id).bind(*qty).bind(Json(product));
        }
        q.execute(&mut *conn).await?;
        Ok(())
    }
}
