//! Decoding of aggregate JSON documents into typed entity graphs.
//!
//! List and single-entity reads return one JSON document built by Postgres
//! (`json_agg` over the page of rows, with nested `to_jsonb` / `json_agg`
//! sub-selects for children). The entity types carry `#[serde(default)]` on
//! child collections and `Option` on optional sub-objects, so a missing
//! category or an empty image list decodes cleanly.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::HydrationError;

/// Decode a single aggregate document.
pub fn hydrate_one<T: DeserializeOwned>(target: &'static str, raw: Value) -> Result<T, HydrationError> {
    serde_json::from_value(raw).map_err(|source| HydrationError { target, source })
}

/// Decode an array of aggregate documents. SQL `NULL` and JSON `null` both
/// decode to an empty list.
pub fn hydrate_many<T: DeserializeOwned>(
    target: &'static str,
    raw: Option<Value>,
) -> Result<Vec<T>, HydrationError> {
    match raw {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => hydrate_one(target, value),
    }
}
