//! Order domain rules: status values, role-based status permissions, line
//! validation, totals, and order list filters.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::listing::{
    normalize_search, DateRange, PageWindow, SortDirection, SortField, SortOrder, SortSpec,
};
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle status of an order. Stored as lowercase text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Waiting,
    Shipping,
    Completed,
    Canceled,
}

impl OrderStatus {
    pub const ALL: &'static [OrderStatus] = &[
        OrderStatus::Waiting,
        OrderStatus::Shipping,
        OrderStatus::Completed,
        OrderStatus::Canceled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Waiting => "waiting",
            OrderStatus::Shipping => "shipping",
            OrderStatus::Completed => "completed",
            OrderStatus::Canceled => "canceled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s.trim().to_ascii_lowercase())
            .ok_or_else(|| CoreError::Validation(format!("Unknown order status '{s}'")))
    }
}

/// Statuses a caller may set on update.
///
/// Customers may only cancel; admins may set any status.
pub fn allowed_statuses(is_admin: bool) -> &'static [OrderStatus] {
    if is_admin {
        OrderStatus::ALL
    } else {
        &[OrderStatus::Canceled]
    }
}

/// Reject a status change the caller's role does not permit.
pub fn validate_status_for_role(status: OrderStatus, is_admin: bool) -> Result<(), CoreError> {
    if allowed_statuses(is_admin).contains(&status) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Status '{status}' is not allowed for this user"
        )))
    }
}

// ---------------------------------------------------------------------------
// Lines and totals
// ---------------------------------------------------------------------------

/// Validate requested line quantities: at least one line, each quantity >= 1.
pub fn validate_order_lines(quantities: &[i32]) -> Result<(), CoreError> {
    if quantities.is_empty() {
        return Err(CoreError::Validation(
            "Order must contain at least one product".to_string(),
        ));
    }
    if let Some(index) = quantities.iter().position(|q| *q < 1) {
        return Err(CoreError::Validation(format!(
            "Quantity of line {index} must be at least 1"
        )));
    }
    Ok(())
}

/// Sum of `price * qty` over the given lines.
pub fn total_paid<I>(lines: I) -> f64
where
    I: IntoIterator<Item = (f64, i32)>,
{
    lines
        .into_iter()
        .map(|(price, qty)| price * f64::from(qty))
        .sum()
}

// ---------------------------------------------------------------------------
// Order listing
// ---------------------------------------------------------------------------

const ORDER_SORT_FIELDS: &[SortField] = &[
    SortField {
        name: "id",
        column: "\"o\".\"id\"",
    },
    SortField {
        name: "created_at",
        column: "\"o\".\"created_at\"",
    },
];

/// Order sort allow-list. Defaults to `id DESC`.
pub const ORDER_SORT: SortSpec = SortSpec {
    fields: ORDER_SORT_FIELDS,
    default_field: ORDER_SORT_FIELDS[0],
    default_direction: SortDirection::Desc,
    tiebreak: "\"o\".\"id\"",
};

/// Raw order list query.
#[derive(Debug, Default, Deserialize)]
pub struct OrderListParams {
    pub id: Option<DbId>,
    pub search: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub order_by: Option<String>,
    pub sort: Option<String>,
}

/// Normalised order filter consumed by the query composer.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderFilter {
    pub id: Option<DbId>,
    pub search: Option<String>,
    pub status: Option<OrderStatus>,
    pub created: DateRange,
    pub window: PageWindow,
    pub sort: SortOrder,
}

impl Default for OrderFilter {
    fn default() -> Self {
        Self {
            id: None,
            search: None,
            status: None,
            created: DateRange::default(),
            window: PageWindow::default(),
            sort: ORDER_SORT.default_order(),
        }
    }
}

impl OrderFilter {
    /// Normalise raw parameters. Only malformed dates are rejected; an
    /// unknown status is dropped like any other unrecognised value.
    pub fn from_params(params: &OrderListParams) -> Result<Self, CoreError> {
        Ok(Self {
            id: params.id,
            search: normalize_search(params.search.as_deref()),
            status: params.status.as_deref().and_then(|s| s.parse().ok()),
            created: DateRange::parse(params.start_date.as_deref(), params.end_date.as_deref())?,
            window: PageWindow::new(params.page, params.limit),
            sort: ORDER_SORT.resolve(params.order_by.as_deref(), params.sort.as_deref()),
        })
    }
}
