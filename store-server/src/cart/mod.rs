//! 购物车
//!
//! 会话级的待定预订状态，不落库。变更成功后同步通知所有已注册的
//! 观察者（用于刷新页面上的运行合计）。
//!
//! 校验的不对称性是有意为之并受测试钉死的：
//! - `add` 超出上限 → 拒绝并携带上下文（当前数量、上限/可用库存）
//! - `set_quantity` 超出上限 → 静默收敛到上限（UI 纠正语义）

use crate::orders::money::to_decimal;
use rust_decimal::Decimal;
use shared::models::Product;
use thiserror::Error;

/// Business-rule rejection for cart mutations. Carries the data the caller
/// needs to display the refusal instead of exceptions-as-control-flow.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    #[error("At most {limit} of this product per order (cart already holds {in_cart})")]
    QuantityLimitExceeded { in_cart: i64, limit: i64 },

    #[error("Insufficient stock: {available} available")]
    InsufficientStock { available: i64 },
}

/// Observer interface, notified synchronously after every successful mutation
pub trait CartObserver: Send + Sync {
    fn cart_changed(&self);
}

/// A pending, unpersisted reservation intent
#[derive(Debug, Clone)]
pub struct CartLine {
    /// Product snapshot the line was validated against
    pub product: Product,
    pub quantity: i64,
}

/// Session-scoped cart
#[derive(Default)]
pub struct Cart {
    lines: Vec<CartLine>,
    observers: Vec<Box<dyn CartObserver>>,
}

impl std::fmt::Debug for Cart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cart")
            .field("lines", &self.lines)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn subscribe(&mut self, observer: Box<dyn CartObserver>) {
        self.observers.push(observer);
    }

    /// Units of `product_id` currently in the cart
    pub fn quantity_of(&self, product_id: i64) -> i64 {
        self.lines
            .iter()
            .find(|l| l.product.id == product_id)
            .map(|l| l.quantity)
            .unwrap_or(0)
    }

    /// Add `quantity` units of `product`.
    ///
    /// Policy, evaluated in this order:
    /// 1. per-order cap exceeded → [`CartError::QuantityLimitExceeded`]
    /// 2. strict stock control and post-add total above stock →
    ///    [`CartError::InsufficientStock`]
    /// 3. non-positive quantity → accepted no-op
    pub fn add(&mut self, product: &Product, quantity: i64) -> Result<(), CartError> {
        let in_cart = self.quantity_of(product.id);
        let new_total = in_cart + quantity;

        if let Some(limit) = product.order_cap()
            && new_total > limit
        {
            return Err(CartError::QuantityLimitExceeded { in_cart, limit });
        }

        if product.strict_stock_control && new_total > product.stock {
            return Err(CartError::InsufficientStock {
                available: product.stock,
            });
        }

        if quantity <= 0 {
            return Ok(());
        }

        match self.lines.iter_mut().find(|l| l.product.id == product.id) {
            Some(line) => line.quantity += quantity,
            None => self.lines.push(CartLine {
                product: product.clone(),
                quantity,
            }),
        }

        self.notify();
        Ok(())
    }

    /// Set the quantity of an existing line. Instead of rejecting, the value
    /// is clamped to the stock ceiling (strict control) and then to the
    /// per-order cap; a final quantity <= 0 removes the line. Returns the
    /// quantity actually applied.
    pub fn set_quantity(&mut self, product_id: i64, quantity: i64) -> i64 {
        let Some(line) = self.lines.iter_mut().find(|l| l.product.id == product_id) else {
            return 0;
        };

        let mut applied = quantity;
        if line.product.strict_stock_control && applied > line.product.stock {
            applied = line.product.stock;
        }
        if let Some(limit) = line.product.order_cap()
            && applied > limit
        {
            applied = limit;
        }

        line.quantity = applied;

        if applied <= 0 {
            self.remove(product_id);
        } else {
            self.notify();
        }
        applied
    }

    pub fn remove(&mut self, product_id: i64) {
        let before = self.lines.len();
        self.lines.retain(|l| l.product.id != product_id);
        if self.lines.len() != before {
            self.notify();
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.notify();
    }

    /// Running total, computed on demand and never cached
    pub fn total(&self) -> Decimal {
        self.lines
            .iter()
            .map(|l| to_decimal(l.product.price) * Decimal::from(l.quantity))
            .sum()
    }

    fn notify(&self) {
        for observer in &self.observers {
            observer.cart_changed();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn product(id: i64, stock: i64, cap: Option<i64>, strict: bool) -> Product {
        Product {
            id,
            name: format!("Product {id}"),
            description: None,
            price: 10.0,
            stock,
            low_stock_threshold: 5,
            low_stock_alert_sent: false,
            max_quantity_per_order: cap,
            strict_stock_control: strict,
            is_active: true,
            created_at: 0,
            updated_at: 0,
        }
    }

    struct Counter(Arc<AtomicUsize>);

    impl CartObserver for Counter {
        fn cart_changed(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_add_rejects_over_cap_set_clamps() {
        // Product P: stock=10, max per order=5, strict
        let p = product(1, 10, Some(5), true);
        let mut cart = Cart::new();

        cart.add(&p, 3).unwrap();
        assert_eq!(cart.quantity_of(1), 3);

        // Add 3 more: would total 6 > 5, rejected with context
        let err = cart.add(&p, 3).unwrap_err();
        assert_eq!(err, CartError::QuantityLimitExceeded { in_cart: 3, limit: 5 });
        assert_eq!(cart.quantity_of(1), 3, "rejection has no side effect");

        // Same overflow through set_quantity clamps instead
        assert_eq!(cart.set_quantity(1, 8), 5);
        assert_eq!(cart.quantity_of(1), 5);
    }

    #[test]
    fn test_add_rejects_over_stock_when_strict() {
        let p = product(1, 4, None, true);
        let mut cart = Cart::new();
        cart.add(&p, 3).unwrap();
        let err = cart.add(&p, 2).unwrap_err();
        assert_eq!(err, CartError::InsufficientStock { available: 4 });
    }

    #[test]
    fn test_non_strict_allows_backorder() {
        let p = product(1, 0, None, false);
        let mut cart = Cart::new();
        cart.add(&p, 3).unwrap();
        assert_eq!(cart.quantity_of(1), 3);
    }

    #[test]
    fn test_cap_checked_before_stock() {
        // Both constraints violated: cap wins, per policy order
        let p = product(1, 2, Some(3), true);
        let mut cart = Cart::new();
        let err = cart.add(&p, 4).unwrap_err();
        assert!(matches!(err, CartError::QuantityLimitExceeded { .. }));
    }

    #[test]
    fn test_add_non_positive_is_noop() {
        let p = product(1, 10, None, true);
        let mut cart = Cart::new();
        cart.add(&p, 0).unwrap();
        cart.add(&p, -2).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_clamps_to_stock_then_cap() {
        let p = product(1, 4, Some(6), true);
        let mut cart = Cart::new();
        cart.add(&p, 2).unwrap();
        // stock ceiling (4) is tighter than the cap (6)
        assert_eq!(cart.set_quantity(1, 10), 4);
    }

    #[test]
    fn test_set_quantity_zero_removes_line() {
        let p = product(1, 10, None, false);
        let mut cart = Cart::new();
        cart.add(&p, 2).unwrap();
        cart.set_quantity(1, 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_total_is_computed_on_demand() {
        let mut cheap = product(1, 10, None, false);
        cheap.price = 2.5;
        let mut dear = product(2, 10, None, false);
        dear.price = 19.99;

        let mut cart = Cart::new();
        cart.add(&cheap, 4).unwrap();
        cart.add(&dear, 1).unwrap();
        assert_eq!(cart.total(), to_decimal(29.99));

        cart.set_quantity(1, 1);
        assert_eq!(cart.total(), to_decimal(22.49));
    }

    #[test]
    fn test_observer_notified_after_successful_mutations_only() {
        let counter = Arc::new(AtomicUsize::new(0));
        let p = product(1, 10, Some(5), true);
        let mut cart = Cart::new();
        cart.subscribe(Box::new(Counter(counter.clone())));

        cart.add(&p, 3).unwrap(); // +1
        let _ = cart.add(&p, 99); // rejected, no notification
        cart.set_quantity(1, 2); // +1
        cart.remove(1); // +1
        cart.remove(1); // nothing to remove, no notification

        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }
}
