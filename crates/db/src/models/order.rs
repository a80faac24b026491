//! Order aggregate and DTOs.

use serde::{Deserialize, Serialize};
use storefront_core::order::OrderStatus;
use storefront_core::types::{DbId, Timestamp};

use super::null_as_default;
use super::product::Product;

/// Proof of payment attached to an order, stored as JSONB.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferSlip {
    pub id: String,
    pub filename: String,
    pub url: String,
    pub created_at: Timestamp,
}

/// One order line: quantity plus the product as it was when ordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: DbId,
    pub order_id: DbId,
    pub qty: i32,
    pub product: Product,
}

/// An order with its line snapshots, hydrated from one aggregate document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: DbId,
    pub user_id: DbId,
    #[serde(default)]
    pub transfer_slip: Option<TransferSlip>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub products: Vec<OrderLine>,
    pub address: String,
    pub contact: String,
    pub status: OrderStatus,
    pub total_paid: f64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A requested line: which product, how many.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderLine {
    pub product_id: DbId,
    pub qty: i32,
}

/// DTO for placing an order. The owning user comes from the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrder {
    pub address: String,
    pub contact: String,
    #[serde(default)]
    pub products: Vec<CreateOrderLine>,
}

/// Transfer slip as supplied by a client. Missing id and timestamp are
/// generated on update.
#[derive(Debug, Clone, Deserialize)]
pub struct TransferSlipInput {
    pub id: Option<String>,
    pub filename: String,
    pub url: String,
    pub created_at: Option<Timestamp>,
}

/// DTO for updating order-level fields. Lines are never touched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateOrder {
    pub status: Option<OrderStatus>,
    pub transfer_slip: Option<TransferSlipInput>,
}
