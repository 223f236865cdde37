//! Coupon Model

use serde::{Deserialize, Serialize};

/// Discount kind (折扣类型)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum CouponKind {
    /// -X percent of the order subtotal
    Percentage,
    /// -X fixed amount
    FixedAmount,
    /// Shipping fee waived
    FreeShipping,
}

/// Coupon entity. `code` is unique at the store level
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Coupon {
    pub id: i64,
    pub code: String,
    pub kind: CouponKind,
    /// Percent or amount depending on `kind`
    pub value: f64,
    pub minimum_order_amount: f64,
    /// 0 = unlimited
    pub max_usages: i64,
    pub used_count: i64,
    /// Unix millis, None = never expires
    pub expires_at: Option<i64>,
    pub is_active: bool,
    pub created_at: i64,
}

/// One redemption record, written in the same transaction as the order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CouponUsage {
    pub id: i64,
    pub coupon_id: i64,
    pub order_id: i64,
    pub email: String,
    pub used_at: i64,
}
