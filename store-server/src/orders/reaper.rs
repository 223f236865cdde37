//! Order Expiry Reaper
//!
//! 定时清理超时未支付的卡支付订单：逐单在一个事务内完成
//! Cancelled/Reversed 流转与逐行库存回补。订单级守卫（状态复查）
//! 保证两次相邻扫描不会重复回补；循环本身串行执行,下一个 tick
//! 要等上一次扫描结束。

use crate::orders::lifecycle;
use crate::utils::{AppError, AppResult};
use crate::db::repository::order;
use shared::models::{Order, payment_method};
use shared::util::now_millis;
use sqlx::SqlitePool;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Periodic sweep over expired unpaid card orders
pub struct OrderExpiryReaper {
    pool: SqlitePool,
    /// Time between sweeps
    interval: Duration,
    /// Age after which an unpaid card order is considered stale
    timeout_minutes: i64,
    shutdown: CancellationToken,
}

impl OrderExpiryReaper {
    pub fn new(
        pool: SqlitePool,
        interval: Duration,
        timeout_minutes: i64,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            pool,
            interval,
            timeout_minutes,
            shutdown,
        }
    }

    /// Reaper loop. The first sweep runs immediately, then on a fixed
    /// interval. A sweep-level error is logged and the loop continues to the
    /// next tick; it never takes the process down.
    pub async fn run(self) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            timeout_minutes = self.timeout_minutes,
            "Order expiry reaper started"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            match self.sweep().await {
                Ok(0) => {}
                Ok(n) => tracing::info!(cancelled = n, "Expired orders cleaned up"),
                Err(e) => tracing::error!(error = %e, "Reaper sweep failed, continuing next interval"),
            }
        }

        tracing::info!("Order expiry reaper stopped");
    }

    /// One sweep. Returns the number of orders cancelled. Per-order failures
    /// are logged and do not abort the rest of the batch; the failed order
    /// stays Unprocessed/Due and is retried on the next sweep.
    pub async fn sweep(&self) -> AppResult<usize> {
        let cutoff =
            now_millis() - chrono::Duration::minutes(self.timeout_minutes).num_milliseconds();
        let expired = order::find_expired_due(&self.pool, payment_method::CARD, cutoff).await?;

        if expired.is_empty() {
            return Ok(0);
        }

        tracing::info!(count = expired.len(), "Processing expired unpaid orders");

        let mut cancelled = 0;
        for order in &expired {
            match self.cancel_expired(order).await {
                Ok(true) => cancelled += 1,
                // Guard did not match: a concurrent actor (payment
                // confirmation, overlapping sweep) got there first
                Ok(false) => {
                    tracing::debug!(order_id = order.id, "Order no longer eligible, skipping")
                }
                Err(e) => {
                    tracing::error!(order_id = order.id, error = %e, "Failed to cancel expired order")
                }
            }
        }

        Ok(cancelled)
    }

    /// Cancel one order: status flip and N item credits commit together, so
    /// a crash mid-sweep can never leave an order half-credited.
    async fn cancel_expired(&self, order: &Order) -> Result<bool, AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(e))?;

        let reason = format!(
            "Automatic cancellation (expired card payment #{})",
            order.id
        );
        let done = lifecycle::cancel_unpaid(&mut tx, order.id, &reason)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;

        if done {
            tx.commit().await.map_err(|e| AppError::database(e))?;
            tracing::info!(order_id = order.id, "Expired order cancelled, stock restored");
        } else {
            tx.rollback().await.map_err(|e| AppError::database(e))?;
        }
        Ok(done)
    }
}
