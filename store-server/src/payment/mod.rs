//! Payment collaborator seam
//!
//! 支付网关作为外部黑盒：创建结账会话、查询会话是否已支付。
//! 引擎只消费 Paid / not-Paid 这一最终一致的外部事实。

use async_trait::async_trait;
use shared::models::{Order, OrderItem};
use thiserror::Error;

/// Handle returned by the gateway for a created checkout session
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Payment gateway error: {0}")]
    Gateway(String),
}

/// External payment provider
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a hosted checkout session for the order
    async fn create_checkout_session(
        &self,
        order: &Order,
        items: &[OrderItem],
    ) -> Result<CheckoutSession, PaymentError>;

    /// Whether the given session has been paid
    async fn is_payment_successful(&self, session_id: &str) -> Result<bool, PaymentError>;
}
