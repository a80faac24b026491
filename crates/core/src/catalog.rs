//! Catalog rules: product/category input validation, product list filters,
//! and the partial-update price guard.

use serde::Deserialize;

use crate::error::CoreError;
use crate::listing::{normalize_search, PageWindow, SortDirection, SortField, SortOrder, SortSpec};
use crate::types::DbId;

/// Maximum length of a product or category title.
pub const MAX_TITLE_LEN: usize = 255;

// ---------------------------------------------------------------------------
// Product listing
// ---------------------------------------------------------------------------

const PRODUCT_SORT_FIELDS: &[SortField] = &[
    SortField {
        name: "id",
        column: "\"p\".\"id\"",
    },
    SortField {
        name: "title",
        column: "\"p\".\"title\"",
    },
    SortField {
        name: "price",
        column: "\"p\".\"price\"",
    },
];

/// Product sort allow-list. Defaults to `title ASC`.
pub const PRODUCT_SORT: SortSpec = SortSpec {
    fields: PRODUCT_SORT_FIELDS,
    default_field: PRODUCT_SORT_FIELDS[1],
    default_direction: SortDirection::Asc,
    tiebreak: "\"p\".\"id\"",
};

/// Raw product list query (`?id=&search=&page=&limit=&order_by=&sort=`).
#[derive(Debug, Default, Deserialize)]
pub struct ProductListParams {
    pub id: Option<DbId>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub order_by: Option<String>,
    pub sort: Option<String>,
}

/// Normalised product filter consumed by the query composer.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductFilter {
    pub id: Option<DbId>,
    pub search: Option<String>,
    pub window: PageWindow,
    pub sort: SortOrder,
}

impl Default for ProductFilter {
    fn default() -> Self {
        Self {
            id: None,
            search: None,
            window: PageWindow::default(),
            sort: PRODUCT_SORT.default_order(),
        }
    }
}

impl From<&ProductListParams> for ProductFilter {
    fn from(params: &ProductListParams) -> Self {
        Self {
            id: params.id,
            search: normalize_search(params.search.as_deref()),
            window: PageWindow::new(params.page, params.limit),
            sort: PRODUCT_SORT.resolve(params.order_by.as_deref(), params.sort.as_deref()),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_title(kind: &str, title: &str) -> Result<(), CoreError> {
    if title.trim().is_empty() {
        return Err(CoreError::Validation(format!("{kind} title must not be empty")));
    }
    if title.len() > MAX_TITLE_LEN {
        return Err(CoreError::Validation(format!(
            "{kind} title must not exceed {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate a new product before any write is attempted.
///
/// The category reference must be present and positive.
pub fn validate_new_product(
    title: &str,
    price: f64,
    category_id: Option<DbId>,
) -> Result<(), CoreError> {
    validate_title("Product", title)?;
    if !price.is_finite() || price < 0.0 {
        return Err(CoreError::Validation(
            "Product price must be a non-negative number".to_string(),
        ));
    }
    match category_id {
        Some(id) if id > 0 => Ok(()),
        _ => Err(CoreError::Validation("category id is invalid".to_string())),
    }
}

/// Whether a partial update is allowed to write `price`.
///
/// The guard requires the value to be non-zero and below zero while also
/// being non-negative. No value satisfies all three, so `update` never
/// changes a stored price.
pub fn price_update_applies(price: f64) -> bool {
    let non_zero = price != 0.0;
    let below_zero = price < 0.0;
    let non_negative = price >= 0.0;
    non_zero && below_zero && non_negative
}

/// Validate a bulk category insert.
pub fn validate_category_titles(titles: &[String]) -> Result<(), CoreError> {
    if titles.is_empty() {
        return Err(CoreError::Validation(
            "At least one category is required".to_string(),
        ));
    }
    for title in titles {
        validate_title("Category", title)?;
    }
    Ok(())
}
