//! Order state machine
//!
//! 状态链：Unprocessed → Processing → Processed → Shipping → Fulfilled,
//! Cancelled 仅能从 Unprocessed 到达（自动过期或管理员操作）。
//! 所有流转通过带前置状态的 guarded UPDATE 落库，源状态不符即
//! 报告 `InvalidTransition`,绝不静默应用。

use crate::db::repository::{RepoError, order};
use crate::inventory::ledger::{self, LedgerError};
use crate::notify::{Notification, NotificationQueue, OrderItemLine};
use crate::payment::{PaymentError, PaymentGateway};
use shared::models::{OrderStatus, PaymentStatus};
use sqlx::{SqliteConnection, SqlitePool};
use thiserror::Error;

/// State machine failure
#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("Invalid transition for order {order_id}: {detail}")]
    InvalidTransition { order_id: i64, detail: String },

    #[error("Order {0} not found")]
    NotFound(i64),

    #[error(transparent)]
    Repo(#[from] RepoError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Payment(#[from] PaymentError),
}

impl From<sqlx::Error> for TransitionError {
    fn from(err: sqlx::Error) -> Self {
        TransitionError::Repo(RepoError::from(err))
    }
}

/// The single legal source state for each forward target
fn required_source(target: OrderStatus) -> Option<OrderStatus> {
    match target {
        OrderStatus::Processing => Some(OrderStatus::Unprocessed),
        OrderStatus::Processed => Some(OrderStatus::Processing),
        OrderStatus::Shipping => Some(OrderStatus::Processed),
        OrderStatus::Fulfilled => Some(OrderStatus::Shipping),
        // Unprocessed is initial-only; Cancelled goes through cancel paths
        OrderStatus::Unprocessed | OrderStatus::Cancelled => None,
    }
}

/// Advance an order one step along the fulfilment chain.
///
/// Status-only: no inventory side effect. Entering Processed enqueues the
/// "packed" notification; entering Fulfilled enqueues the post-purchase
/// review request listing the order's items.
pub async fn advance(
    pool: &SqlitePool,
    queue: &NotificationQueue,
    order_id: i64,
    target: OrderStatus,
) -> Result<(), TransitionError> {
    let Some(from) = required_source(target) else {
        return Err(TransitionError::InvalidTransition {
            order_id,
            detail: format!("{target:?} is not a forward transition target"),
        });
    };

    let order = order::find_by_id(pool, order_id)
        .await?
        .ok_or(TransitionError::NotFound(order_id))?;

    if !order::transition_status(pool, order_id, from, target).await? {
        return Err(TransitionError::InvalidTransition {
            order_id,
            detail: format!("{:?} → {target:?} requires {from:?}", order.status),
        });
    }

    tracing::info!(
        order_id = order_id,
        from = ?from,
        to = ?target,
        "Order status advanced"
    );

    match target {
        OrderStatus::Processed => {
            queue.enqueue(Notification::OrderPacked {
                order_id,
                recipient: order.email.clone(),
                customer_name: order.customer_name.clone(),
            });
        }
        OrderStatus::Fulfilled => {
            let items = order::items_for_order(pool, order_id)
                .await?
                .into_iter()
                .map(|i| OrderItemLine {
                    name: i.product_name,
                    quantity: i.quantity,
                    unit_price: i.unit_price,
                })
                .collect();
            queue.enqueue(Notification::ReviewRequest {
                order_id,
                recipient: order.email.clone(),
                customer_name: order.customer_name.clone(),
                items,
            });
        }
        _ => {}
    }

    Ok(())
}

/// The only transition that reverses inventory: guarded
/// Unprocessed/Due → Cancelled/Reversed plus one ledger credit per item,
/// all on the caller's transaction. Returns false when the guard did not
/// match (already paid, already cancelled, already processing), which makes
/// racing sweeps a no-op rather than a double credit.
pub async fn cancel_unpaid(
    conn: &mut SqliteConnection,
    order_id: i64,
    reason: &str,
) -> Result<bool, TransitionError> {
    if !order::cancel_unpaid_guarded(&mut *conn, order_id).await? {
        return Ok(false);
    }

    let items = order::items_for_order_conn(&mut *conn, order_id).await?;
    for item in &items {
        // A line whose product was deleted has nothing to credit back
        let Some(product_id) = item.product_id else {
            continue;
        };
        ledger::credit(&mut *conn, product_id, item.quantity, reason).await?;
    }

    Ok(true)
}

/// Admin override: cancel an unpaid order and restore its reservation
pub async fn cancel_order(pool: &SqlitePool, order_id: i64) -> Result<(), TransitionError> {
    let order = order::find_by_id(pool, order_id)
        .await?
        .ok_or(TransitionError::NotFound(order_id))?;

    let mut tx = pool.begin().await?;
    let reason = format!("Cancelled by administrator (order #{order_id})");
    let cancelled = cancel_unpaid(&mut tx, order_id, &reason).await?;
    if !cancelled {
        return Err(TransitionError::InvalidTransition {
            order_id,
            detail: format!(
                "cancel requires Unprocessed/Due, order is {:?}/{:?}",
                order.status, order.payment_status
            ),
        });
    }
    tx.commit().await?;

    tracing::info!(order_id = order_id, "Order cancelled by administrator");
    Ok(())
}

/// React to the gateway's verdict on a checkout session. Paid sessions flip
/// Due → Paid (guarded); anything else leaves the order untouched. Returns
/// whether the order is now recorded as paid.
pub async fn confirm_payment(
    gateway: &dyn PaymentGateway,
    pool: &SqlitePool,
    order_id: i64,
    session_id: &str,
) -> Result<bool, TransitionError> {
    let order = order::find_by_id(pool, order_id)
        .await?
        .ok_or(TransitionError::NotFound(order_id))?;

    if order.payment_status == PaymentStatus::Paid {
        return Ok(true);
    }

    if !gateway.is_payment_successful(session_id).await? {
        return Ok(false);
    }

    if order::mark_paid_guarded(pool, order_id).await? {
        tracing::info!(order_id = order_id, "Payment confirmed");
        return Ok(true);
    }

    // Guard miss: either a concurrent confirmation won, or the order already
    // left Due (e.g. reversed by the expiry reaper before payment landed)
    let current = order::find_by_id(pool, order_id)
        .await?
        .ok_or(TransitionError::NotFound(order_id))?;
    Ok(current.payment_status == PaymentStatus::Paid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_chain_is_single_step() {
        assert_eq!(
            required_source(OrderStatus::Processing),
            Some(OrderStatus::Unprocessed)
        );
        assert_eq!(
            required_source(OrderStatus::Processed),
            Some(OrderStatus::Processing)
        );
        assert_eq!(
            required_source(OrderStatus::Shipping),
            Some(OrderStatus::Processed)
        );
        assert_eq!(
            required_source(OrderStatus::Fulfilled),
            Some(OrderStatus::Shipping)
        );
    }

    #[test]
    fn test_initial_and_cancelled_are_not_forward_targets() {
        assert_eq!(required_source(OrderStatus::Unprocessed), None);
        assert_eq!(required_source(OrderStatus::Cancelled), None);
    }
}
