//! Notification intents
//!
//! Each state-machine transition or threshold crossing produces a
//! well-defined intent (recipient, template kind, structured data). Rendering
//! to subject/body happens at delivery time in the worker.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// One product line of an aggregated low-stock alert
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LowStockLine {
    pub product_id: i64,
    pub name: String,
    pub stock: i64,
    pub threshold: i64,
}

/// Item line carried by confirmation / review-request intents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemLine {
    pub name: String,
    pub quantity: i64,
    pub unit_price: f64,
}

/// Outbound notification intent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Notification {
    /// Sent to the customer right after a successful checkout commit
    OrderConfirmation {
        order_id: i64,
        recipient: String,
        customer_name: String,
        total_amount: f64,
        tracking_token: String,
        items: Vec<OrderItemLine>,
    },
    /// Sent when an order transitions into Processed
    OrderPacked {
        order_id: i64,
        recipient: String,
        customer_name: String,
    },
    /// Post-purchase review request, sent on transition into Fulfilled
    ReviewRequest {
        order_id: i64,
        recipient: String,
        customer_name: String,
        items: Vec<OrderItemLine>,
    },
    /// Aggregated admin alert for products at or below their threshold
    LowStockAlert {
        recipient: String,
        lines: Vec<LowStockLine>,
    },
    /// Account welcome message
    Welcome { recipient: String, name: String },
}

impl Notification {
    pub fn recipient(&self) -> &str {
        match self {
            Notification::OrderConfirmation { recipient, .. }
            | Notification::OrderPacked { recipient, .. }
            | Notification::ReviewRequest { recipient, .. }
            | Notification::LowStockAlert { recipient, .. }
            | Notification::Welcome { recipient, .. } => recipient,
        }
    }

    /// Template kind label for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::OrderConfirmation { .. } => "order_confirmation",
            Notification::OrderPacked { .. } => "order_packed",
            Notification::ReviewRequest { .. } => "review_request",
            Notification::LowStockAlert { .. } => "low_stock_alert",
            Notification::Welcome { .. } => "welcome",
        }
    }

    /// Render to (subject, body). Body is plain text; the actual transport
    /// formatting lives behind the [`crate::notify::Mailer`] seam.
    pub fn render(&self) -> (String, String) {
        match self {
            Notification::OrderConfirmation {
                order_id,
                customer_name,
                total_amount,
                tracking_token,
                items,
                ..
            } => {
                let mut body = format!(
                    "Dear {customer_name},\n\nThank you for your order #{order_id}.\n\n"
                );
                for item in items {
                    let _ = writeln!(
                        body,
                        "  {} x{} @ {:.2}",
                        item.name, item.quantity, item.unit_price
                    );
                }
                let _ = write!(
                    body,
                    "\nTotal: {total_amount:.2}\nTrack your order: /track-order/{tracking_token}\n"
                );
                (format!("Order confirmation #{order_id}"), body)
            }
            Notification::OrderPacked {
                order_id,
                customer_name,
                ..
            } => (
                format!("Your order #{order_id} has been packed"),
                format!(
                    "Dear {customer_name},\n\nOrder #{order_id} is packed and will ship shortly.\n"
                ),
            ),
            Notification::ReviewRequest {
                order_id,
                customer_name,
                items,
                ..
            } => {
                let mut body = format!(
                    "Dear {customer_name},\n\nOrder #{order_id} is fulfilled. We would love your feedback on:\n"
                );
                for item in items {
                    let _ = writeln!(body, "  - {}", item.name);
                }
                (
                    format!("How did we do? Review your order #{order_id}"),
                    body,
                )
            }
            Notification::LowStockAlert { lines, .. } => {
                let mut body = String::from(
                    "The following products dropped to or below their configured threshold:\n\n",
                );
                for line in lines {
                    let _ = writeln!(
                        body,
                        "  #{} {} — stock {} (threshold {})",
                        line.product_id, line.name, line.stock, line.threshold
                    );
                }
                body.push_str("\nPlease restock via the admin panel.\n");
                ("⚠️ CRITICAL STOCK LEVEL".to_string(), body)
            }
            Notification::Welcome { name, .. } => (
                "Welcome to the store".to_string(),
                format!("Dear {name},\n\nYour account is ready. Happy shopping!\n"),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_stock_alert_aggregates_all_lines() {
        let alert = Notification::LowStockAlert {
            recipient: "admin@store.test".to_string(),
            lines: vec![
                LowStockLine {
                    product_id: 1,
                    name: "Widget".to_string(),
                    stock: 4,
                    threshold: 5,
                },
                LowStockLine {
                    product_id: 2,
                    name: "Gadget".to_string(),
                    stock: 0,
                    threshold: 3,
                },
            ],
        };
        let (subject, body) = alert.render();
        assert!(subject.contains("CRITICAL"));
        assert!(body.contains("Widget") && body.contains("Gadget"));
        assert!(body.contains("stock 4 (threshold 5)"));
    }

    #[test]
    fn test_review_request_enumerates_items() {
        let n = Notification::ReviewRequest {
            order_id: 42,
            recipient: "a@b.test".to_string(),
            customer_name: "Ann".to_string(),
            items: vec![
                OrderItemLine {
                    name: "Widget".to_string(),
                    quantity: 2,
                    unit_price: 9.99,
                },
                OrderItemLine {
                    name: "Gadget".to_string(),
                    quantity: 1,
                    unit_price: 4.5,
                },
            ],
        };
        let (subject, body) = n.render();
        assert!(subject.contains("#42"));
        assert!(body.contains("- Widget"));
        assert!(body.contains("- Gadget"));
    }
}
