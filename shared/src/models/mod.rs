//! Data models
//!
//! Shared between zo-server and the web front end (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! IDs are snowflake `i64`, timestamps Unix millis, money whole currency units.

pub mod client;
pub mod favorite;
pub mod flash_sale;
pub mod order;
pub mod product;
pub mod stock;
pub mod testimonial;

// Re-exports
pub use client::*;
pub use favorite::*;
pub use flash_sale::*;
pub use order::*;
pub use product::*;
pub use stock::*;
pub use testimonial::*;
