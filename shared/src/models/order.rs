//! Order Model
//!
//! 订单与订单行。行快照（名称、单价）在下单时冻结，之后不可变，
//! 与后续的目录编辑解耦。

use serde::{Deserialize, Serialize};

/// Order fulfilment status
///
/// Legal chain: Unprocessed → Processing → Processed → Shipping → Fulfilled.
/// Cancelled is reachable from Unprocessed only (automated expiry or admin
/// override).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum OrderStatus {
    #[default]
    Unprocessed,
    Processing,
    Processed,
    Shipping,
    Fulfilled,
    Cancelled,
}

/// Payment status, an independent axis tracked alongside [`OrderStatus`]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum PaymentStatus {
    #[default]
    Due,
    Paid,
    Reversed,
}

/// Payment method literals stored on the order row
pub mod payment_method {
    /// Card payments go through the gateway and are subject to expiry
    pub const CARD: &str = "CARD";
    /// Cash on delivery, never expired by the reaper
    pub const CASH_ON_DELIVERY: &str = "CASH_ON_DELIVERY";
    /// Bank transfer
    pub const TRANSFER: &str = "TRANSFER";
}

/// Order entity. Never deleted (audit requirement)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    /// Opaque random token for public order tracking
    pub secret_token: String,
    pub customer_name: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub zip: String,
    pub phone_number: String,
    pub shipping_method: String,
    pub payment_method: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    /// Σ(item.unit_price × quantity) − discount + shipping fee, fixed at
    /// commit time
    pub total_amount: f64,
    pub discount_amount: f64,
    pub shipping_fee: f64,
    pub coupon_id: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Order {
    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
    }
}

/// A line of a committed order, immutable after creation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    /// Nullable so the line survives product deletion
    pub product_id: Option<i64>,
    /// Name snapshot taken at order time
    pub product_name: String,
    /// Unit price snapshot taken at order time
    pub unit_price: f64,
    pub quantity: i64,
}

/// Customer details collected at checkout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub zip: String,
    pub phone_number: String,
    pub shipping_method: String,
    pub payment_method: String,
}
