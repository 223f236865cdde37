//! Data models
//!
//! Shared between store-server and any API consumer.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY).

pub mod coupon;
pub mod order;
pub mod product;
pub mod setting;
pub mod stock_log;

// Re-exports
pub use coupon::*;
pub use order::*;
pub use product::*;
pub use setting::*;
pub use stock_log::*;
