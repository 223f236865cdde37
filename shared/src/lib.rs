//! Shared types for the store pipeline
//!
//! Domain models and small utilities used by the server crate
//! (and, via API serialization, by any future frontend).

pub mod models;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use models::{
    Coupon, CouponKind, CouponUsage, Order, OrderItem, OrderStatus, PaymentStatus, Product,
    Setting, StockLogEntry,
};
