//! Delivery collaborator seam
//!
//! SMTP mechanics live behind this trait; the engine only needs to know
//! whether a send succeeded, failed transiently, or is misconfigured.

use async_trait::async_trait;
use thiserror::Error;

/// Delivery failure classes: the worker retries transient failures and
/// skips misconfigured ones.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Transient delivery failure: {0}")]
    Transient(String),

    #[error("Delivery misconfigured: {0}")]
    Config(String),
}

/// Outbound message transport
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, body: &str)
    -> Result<(), DeliveryError>;
}

/// Development transport: writes the message to the log and reports success
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), DeliveryError> {
        tracing::info!(
            recipient = recipient,
            subject = subject,
            bytes = body.len(),
            "Mail delivered (log transport)"
        );
        Ok(())
    }
}
