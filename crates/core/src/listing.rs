//! Filter, sort and pagination value objects shared by list endpoints.
//!
//! Out-of-range or unrecognised input is normalised to a documented default
//! instead of being rejected. Calendar dates are the exception: a malformed
//! value is an input error.

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

/// First page number; pages are 1-based.
pub const DEFAULT_PAGE: i64 = 1;

/// Default (and minimum) number of items per page.
pub const DEFAULT_LIMIT: i64 = 5;

/// Largest page size a caller can ask for.
pub const MAX_LIMIT: i64 = 100;

/// Highest page number accepted; larger values are clamped.
pub const MAX_PAGE: i64 = 1_000_000;

/// A normalised page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: i64,
    pub limit: i64,
}

impl PageWindow {
    /// Build a window from raw query values.
    ///
    /// Pages below 1 become 1 and limits below [`DEFAULT_LIMIT`] become
    /// [`DEFAULT_LIMIT`]. Values above [`MAX_PAGE`] / [`MAX_LIMIT`] are
    /// clamped to the ceiling.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        let page = page
            .filter(|p| *p >= DEFAULT_PAGE)
            .unwrap_or(DEFAULT_PAGE)
            .min(MAX_PAGE);
        let limit = limit
            .filter(|l| *l >= DEFAULT_LIMIT)
            .unwrap_or(DEFAULT_LIMIT)
            .min(MAX_LIMIT);
        Self { page, limit }
    }

    /// Row offset of the first item on this page.
    pub fn offset(&self) -> i64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }

    /// Number of pages needed to show `total_items` at this window's limit.
    pub fn total_pages(&self, total_items: i64) -> i64 {
        if total_items <= 0 || self.limit <= 0 {
            return 0;
        }
        total_items / self.limit + i64::from(total_items % self.limit != 0)
    }
}

impl Default for PageWindow {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Pagination envelope returned by list operations.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T: Serialize> {
    pub data: Vec<T>,
    pub page: i64,
    pub limit: i64,
    pub total_item: i64,
    pub total_page: i64,
}

impl<T: Serialize> Page<T> {
    pub fn new(data: Vec<T>, window: PageWindow, total_item: i64) -> Self {
        Self {
            data,
            page: window.page,
            limit: window.limit,
            total_item,
            total_page: window.total_pages(total_item),
        }
    }
}

// ---------------------------------------------------------------------------
// Sorting
// ---------------------------------------------------------------------------

/// Sort direction. Rendered verbatim into `ORDER BY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    /// Parse `asc`/`desc` (any case). Anything else yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "ASC" => Some(SortDirection::Asc),
            "DESC" => Some(SortDirection::Desc),
            _ => None,
        }
    }
}

/// An allow-listed sort field: the public name and the SQL expression it maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortField {
    pub name: &'static str,
    pub column: &'static str,
}

/// Per-entity sort allow-list with its defaults.
#[derive(Debug, Clone, Copy)]
pub struct SortSpec {
    pub fields: &'static [SortField],
    pub default_field: SortField,
    pub default_direction: SortDirection,
    /// Unique column appended after the chosen field so that rows with equal
    /// sort values keep a stable order across pages.
    pub tiebreak: &'static str,
}

/// A resolved sort: only ever built from a [`SortSpec`] allow-list, so the
/// columns are safe to interpolate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub field: SortField,
    pub direction: SortDirection,
    pub tiebreak: &'static str,
}

impl SortOrder {
    /// The `ORDER BY` body, e.g. `"p"."title" ASC, "p"."id" ASC`.
    pub fn to_sql(&self) -> String {
        let dir = self.direction.as_sql();
        if self.field.column == self.tiebreak {
            format!("{} {dir}", self.field.column)
        } else {
            format!("{} {dir}, {} {dir}", self.field.column, self.tiebreak)
        }
    }
}

impl SortSpec {
    /// Resolve raw `order_by` / `sort` query values against the allow-list.
    pub fn resolve(&self, order_by: Option<&str>, sort: Option<&str>) -> SortOrder {
        let field = order_by
            .map(str::trim)
            .and_then(|name| self.fields.iter().find(|f| f.name == name))
            .copied()
            .unwrap_or(self.default_field);
        let direction = sort
            .and_then(SortDirection::parse)
            .unwrap_or(self.default_direction);
        SortOrder {
            field,
            direction,
            tiebreak: self.tiebreak,
        }
    }

    pub fn default_order(&self) -> SortOrder {
        SortOrder {
            field: self.default_field,
            direction: self.default_direction,
            tiebreak: self.tiebreak,
        }
    }
}

// ---------------------------------------------------------------------------
// Text and date filters
// ---------------------------------------------------------------------------

/// Trim a free-text search term, dropping it when empty.
pub fn normalize_search(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Inclusive calendar-day range. Either end may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// Parse `YYYY-MM-DD` bounds; blank values are treated as absent.
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self, CoreError> {
        Ok(Self {
            start: parse_day("start_date", start)?,
            end: parse_day("end_date", end)?,
        })
    }
}

fn parse_day(field: &str, raw: Option<&str>) -> Result<Option<NaiveDate>, CoreError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                CoreError::Validation(format!(
                    "{field} '{value}' is not a valid date (expected YYYY-MM-DD)"
                ))
            }),
    }
}
