//! Seeded roles. Ids and names must match the `roles` rows inserted by
//! `20261001000001_create_users.sql`; `schema_conventions` checks this.

use crate::types::DbId;

pub const ROLE_CUSTOMER: &str = "customer";
pub const ROLE_ADMIN: &str = "admin";

pub const ROLE_ID_CUSTOMER: DbId = 1;
pub const ROLE_ID_ADMIN: DbId = 2;
