pub mod appinfo;
pub mod auth;
pub mod categories;
pub mod files;
pub mod health;
pub mod orders;
pub mod products;
pub mod users;
