//! Domain types, validation rules, and collaborator traits shared by the
//! persistence layer and the HTTP layer.
//!
//! This crate has no internal dependencies so it can be used by the db, cloud
//! and api crates alike.

pub mod catalog;
pub mod error;
pub mod listing;
pub mod order;
pub mod roles;
pub mod storage;
pub mod types;
