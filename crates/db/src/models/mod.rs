//! Domain model structs and DTOs.
//!
//! Entities hydrated from aggregate documents derive `Deserialize`; plain
//! rows derive `FromRow`. Request DTOs derive `Deserialize`.

use serde::{Deserialize, Deserializer};

pub mod category;
pub mod image;
pub mod order;
pub mod product;
pub mod session;
pub mod user;

/// Treat an explicit JSON `null` like a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
