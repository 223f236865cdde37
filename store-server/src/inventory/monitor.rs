//! Inventory Threshold Monitor
//!
//! 每轮两遍扫描：
//! 1. 告警: 活跃且 stock <= threshold 且未标记的商品,聚合成一封
//!    管理员告警入队,入队成功后整批置位 `low_stock_alert_sent`
//! 2. 复位: stock 回升到阈值之上的商品清除标记,不发恢复通知
//!
//! 标记是滞回锁存：同一次低库存事件只告警一次。

use crate::db::repository::product;
use crate::notify::{LowStockLine, Notification, NotificationQueue};
use crate::utils::AppResult;
use sqlx::SqlitePool;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Periodic low-stock alert sweep
pub struct InventoryThresholdMonitor {
    pool: SqlitePool,
    queue: NotificationQueue,
    /// Destination for aggregated alerts; missing = alerts are skipped and
    /// reported as not sent (the episode stays unflagged)
    admin_email: Option<String>,
    interval: Duration,
    /// Delay before the first check so the system can stabilize after boot
    startup_delay: Duration,
    shutdown: CancellationToken,
}

impl InventoryThresholdMonitor {
    pub fn new(
        pool: SqlitePool,
        queue: NotificationQueue,
        admin_email: Option<String>,
        interval: Duration,
        startup_delay: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            pool,
            queue,
            admin_email,
            interval,
            startup_delay,
            shutdown,
        }
    }

    /// Monitor loop: startup delay, then fixed-interval checks. A failed
    /// cycle is logged and never stops future cycles.
    pub async fn run(self) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            startup_delay_secs = self.startup_delay.as_secs(),
            "Inventory threshold monitor started"
        );

        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => {
                tracing::info!("Inventory threshold monitor stopped");
                return;
            }
            _ = tokio::time::sleep(self.startup_delay) => {}
        }

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            if let Err(e) = self.check_inventory().await {
                tracing::error!(error = %e, "Inventory check failed, continuing next interval");
            }
        }

        tracing::info!("Inventory threshold monitor stopped");
    }

    /// One monitoring cycle: alert pass, then clear pass
    pub async fn check_inventory(&self) -> AppResult<()> {
        // Pass 1: products newly at or below their threshold
        let critical = product::find_low_stock_unalerted(&self.pool).await?;

        if !critical.is_empty() {
            match &self.admin_email {
                None => {
                    tracing::warn!(
                        count = critical.len(),
                        "Low-stock alert skipped (not sent): no administrator address configured"
                    );
                }
                Some(addr) => {
                    let lines: Vec<LowStockLine> = critical
                        .iter()
                        .map(|p| LowStockLine {
                            product_id: p.id,
                            name: p.name.clone(),
                            stock: p.stock,
                            threshold: p.low_stock_threshold,
                        })
                        .collect();
                    let ids: Vec<i64> = critical.iter().map(|p| p.id).collect();

                    // One aggregated alert for the whole batch
                    self.queue.enqueue(Notification::LowStockAlert {
                        recipient: addr.clone(),
                        lines,
                    });

                    // Flag only after the alert was handed off, so an episode
                    // is never flagged without a queued alert
                    product::mark_alerts_sent(&self.pool, &ids).await?;
                    tracing::info!(count = ids.len(), "Low-stock alert enqueued, products flagged");
                }
            }
        }

        // Pass 2: reset the latch for recovered products (no notification)
        let cleared = product::clear_alerts_recovered(&self.pool).await?;
        if cleared > 0 {
            tracing::info!(count = cleared, "Low-stock flags cleared after restock");
        }

        Ok(())
    }
}
