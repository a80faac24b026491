//! Response envelopes.
//!
//! Single resources and plain lists are returned as `{ "data": ... }` via
//! [`DataResponse`]. Paged lists use [`storefront_core::listing::Page`], which
//! adds `page`, `limit`, `total_item` and `total_page` beside `data`.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}
