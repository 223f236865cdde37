//! Product Model

use serde::{Deserialize, Serialize};

/// Product entity (商品)
///
/// `stock` is mutated exclusively through the stock ledger so the counter
/// and its audit trail cannot diverge.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    /// Current units on hand, never negative under strict stock control
    pub stock: i64,
    /// Critical level that triggers the low-stock alert
    pub low_stock_threshold: i64,
    /// Hysteresis latch: true only while stock <= threshold and an alert
    /// batch has been delivered for the current episode
    pub low_stock_alert_sent: bool,
    /// None or 0 = unrestricted; otherwise max units per single order
    pub max_quantity_per_order: Option<i64>,
    /// When true the product cannot be ordered beyond current stock
    pub strict_stock_control: bool,
    /// Soft-deactivation flag; products referenced by orders are never
    /// hard-deleted
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Product {
    /// Effective per-order cap: `Some(n)` only when configured and positive
    pub fn order_cap(&self) -> Option<i64> {
        self.max_quantity_per_order.filter(|&n| n > 0)
    }
}

/// Create product payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub stock: Option<i64>,
    pub low_stock_threshold: Option<i64>,
    pub max_quantity_per_order: Option<i64>,
    pub strict_stock_control: Option<bool>,
}

/// Update product payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub low_stock_threshold: Option<i64>,
    pub max_quantity_per_order: Option<i64>,
    pub strict_stock_control: Option<bool>,
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_cap_zero_means_unlimited() {
        let mut p = sample();
        p.max_quantity_per_order = Some(0);
        assert_eq!(p.order_cap(), None);
        p.max_quantity_per_order = None;
        assert_eq!(p.order_cap(), None);
        p.max_quantity_per_order = Some(5);
        assert_eq!(p.order_cap(), Some(5));
    }

    fn sample() -> Product {
        Product {
            id: 1,
            name: "Widget".to_string(),
            description: None,
            price: 9.99,
            stock: 10,
            low_stock_threshold: 5,
            low_stock_alert_sent: false,
            max_quantity_per_order: None,
            strict_stock_control: true,
            is_active: true,
            created_at: 0,
            updated_at: 0,
        }
    }
}
