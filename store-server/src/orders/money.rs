//! Money calculation utilities using rust_decimal for precision
//!
//! All calculations are done using `Decimal` internally, then converted to
//! `f64` for storage/serialization.

use rust_decimal::prelude::*;
use shared::models::{Coupon, CouponKind};

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Convert f64 to Decimal for calculation
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Line total: unit price × quantity
pub fn line_total(unit_price: f64, quantity: i64) -> Decimal {
    to_decimal(unit_price) * Decimal::from(quantity)
}

/// Discount a coupon grants on `subtotal`, capped at the subtotal so the
/// goods part of an order can never go negative. `FreeShipping` discounts
/// nothing here; it waives the fee in the shipping computation instead.
pub fn coupon_discount(coupon: &Coupon, subtotal: Decimal) -> Decimal {
    let discount = match coupon.kind {
        CouponKind::Percentage => {
            (subtotal * to_decimal(coupon.value) / Decimal::ONE_HUNDRED).round_dp(DECIMAL_PLACES)
        }
        CouponKind::FixedAmount => to_decimal(coupon.value),
        CouponKind::FreeShipping => Decimal::ZERO,
    };
    discount.min(subtotal).max(Decimal::ZERO)
}

/// Order total: Σ(line totals) − discount + shipping fee
pub fn order_total(subtotal: Decimal, discount: Decimal, shipping_fee: Decimal) -> Decimal {
    (subtotal - discount + shipping_fee)
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coupon(kind: CouponKind, value: f64) -> Coupon {
        Coupon {
            id: 1,
            code: "TEST".to_string(),
            kind,
            value,
            minimum_order_amount: 0.0,
            max_usages: 0,
            used_count: 0,
            expires_at: None,
            is_active: true,
            created_at: 0,
        }
    }

    #[test]
    fn test_decimal_precision() {
        // Classic floating point problem: 0.1 + 0.2 != 0.3
        let sum = to_decimal(0.1) + to_decimal(0.2);
        assert_eq!(to_f64(sum), 0.3);
    }

    #[test]
    fn test_line_total_accumulation() {
        let total: Decimal = (0..100).map(|_| line_total(0.01, 1)).sum();
        assert_eq!(to_f64(total), 1.0);
    }

    #[test]
    fn test_percentage_discount_rounds_half_up() {
        let c = coupon(CouponKind::Percentage, 10.0);
        // 10% of 33.33 = 3.333 → 3.33
        assert_eq!(to_f64(coupon_discount(&c, to_decimal(33.33))), 3.33);
    }

    #[test]
    fn test_fixed_discount_capped_at_subtotal() {
        let c = coupon(CouponKind::FixedAmount, 50.0);
        assert_eq!(to_f64(coupon_discount(&c, to_decimal(20.0))), 20.0);
    }

    #[test]
    fn test_free_shipping_discounts_nothing() {
        let c = coupon(CouponKind::FreeShipping, 0.0);
        assert_eq!(coupon_discount(&c, to_decimal(100.0)), Decimal::ZERO);
    }

    #[test]
    fn test_order_total_formula() {
        let total = order_total(to_decimal(100.0), to_decimal(15.0), to_decimal(4.99));
        assert_eq!(to_f64(total), 89.99);
    }
}
