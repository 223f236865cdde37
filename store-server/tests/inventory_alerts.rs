//! 库存阈值监控与设置缓存的集成测试
//!
//! 验证滞回锁存语义：同一次低库存事件只告警一次，库存回升后复位，
//! 管理员地址缺失时跳过且不置位。

use shared::models::{Product, ProductCreate};
use sqlx::SqlitePool;
use store_server::db::repository::product;
use store_server::inventory::{InventoryThresholdMonitor, ledger};
use store_server::notify::{Notification, NotificationQueue, NotificationReceiver};
use store_server::settings::keys;
use store_server::{AppState, Config};
use rust_decimal::Decimal;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

async fn setup() -> (tempfile::TempDir, AppState, NotificationReceiver) {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = Config::with_work_dir(dir.path().to_str().unwrap());
    let (state, receiver) = AppState::initialize(&config).await.expect("initialize");
    (dir, state, receiver)
}

async fn seed_product(pool: &SqlitePool, name: &str, stock: i64, threshold: i64) -> Product {
    product::create(
        pool,
        ProductCreate {
            name: name.to_string(),
            description: None,
            price: 10.0,
            stock: Some(stock),
            low_stock_threshold: Some(threshold),
            max_quantity_per_order: None,
            strict_stock_control: Some(true),
        },
    )
    .await
    .expect("seed product")
}

fn monitor(
    pool: &SqlitePool,
    queue: &NotificationQueue,
    admin: Option<&str>,
) -> InventoryThresholdMonitor {
    InventoryThresholdMonitor::new(
        pool.clone(),
        queue.clone(),
        admin.map(str::to_string),
        Duration::from_secs(3600),
        Duration::from_secs(30),
        CancellationToken::new(),
    )
}

async fn adjust_stock(pool: &SqlitePool, product_id: i64, delta: i64, reason: &str) {
    let mut conn = pool.acquire().await.unwrap();
    if delta < 0 {
        ledger::debit(&mut conn, product_id, -delta, reason)
            .await
            .unwrap();
    } else {
        ledger::credit(&mut conn, product_id, delta, reason)
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_hysteresis_alert_once_then_clear_on_recovery() {
    let (_dir, state, mut rx) = setup().await;
    let pool = &state.db.pool;
    // Scenario: product R, threshold 5, stock 6
    let r = seed_product(pool, "R", 6, 5).await;
    let sweeper = monitor(pool, &state.notifications, Some("admin@store.test"));

    // Above threshold: nothing happens
    sweeper.check_inventory().await.unwrap();
    assert!(rx.try_dequeue().is_none());

    // Drops 6 → 4: one aggregated alert naming R, flag latched
    adjust_stock(pool, r.id, -2, "Order #1").await;
    sweeper.check_inventory().await.unwrap();
    match rx.try_dequeue().expect("alert enqueued").notification {
        Notification::LowStockAlert { recipient, lines } => {
            assert_eq!(recipient, "admin@store.test");
            assert_eq!(lines.len(), 1);
            assert_eq!(lines[0].product_id, r.id);
            assert_eq!(lines[0].stock, 4);
            assert_eq!(lines[0].threshold, 5);
        }
        other => panic!("unexpected notification: {other:?}"),
    }
    let flagged = product::find_by_id(pool, r.id).await.unwrap().unwrap();
    assert!(flagged.low_stock_alert_sent);

    // Condition persists: no repeat alert while the latch holds
    sweeper.check_inventory().await.unwrap();
    assert!(rx.try_dequeue().is_none(), "no second alert for the same episode");

    // Rises 4 → 7: flag cleared, no recovery notification
    adjust_stock(pool, r.id, 3, "Restock").await;
    sweeper.check_inventory().await.unwrap();
    assert!(rx.try_dequeue().is_none());
    let cleared = product::find_by_id(pool, r.id).await.unwrap().unwrap();
    assert!(!cleared.low_stock_alert_sent);

    // Drops again: a fresh episode raises a fresh alert
    adjust_stock(pool, r.id, -3, "Order #2").await;
    sweeper.check_inventory().await.unwrap();
    assert!(matches!(
        rx.try_dequeue().unwrap().notification,
        Notification::LowStockAlert { .. }
    ));
}

#[tokio::test]
async fn test_alert_aggregates_batch_into_one_notification() {
    let (_dir, state, mut rx) = setup().await;
    let pool = &state.db.pool;
    seed_product(pool, "A", 2, 5).await;
    seed_product(pool, "B", 0, 3).await;
    seed_product(pool, "Healthy", 50, 5).await;

    monitor(pool, &state.notifications, Some("admin@store.test"))
        .check_inventory()
        .await
        .unwrap();

    match rx.try_dequeue().unwrap().notification {
        Notification::LowStockAlert { lines, .. } => {
            let names: Vec<&str> = lines.iter().map(|l| l.name.as_str()).collect();
            assert_eq!(lines.len(), 2);
            assert!(names.contains(&"A") && names.contains(&"B"));
        }
        other => panic!("unexpected notification: {other:?}"),
    }
    assert!(rx.try_dequeue().is_none(), "exactly one aggregated alert");
}

#[tokio::test]
async fn test_missing_admin_address_skips_without_latching() {
    let (_dir, state, mut rx) = setup().await;
    let pool = &state.db.pool;
    let p = seed_product(pool, "A", 2, 5).await;

    let sweeper = monitor(pool, &state.notifications, None);
    sweeper.check_inventory().await.unwrap();

    // Nothing sent, and the episode stays pending for when config is fixed
    assert!(rx.try_dequeue().is_none());
    let unflagged = product::find_by_id(pool, p.id).await.unwrap().unwrap();
    assert!(!unflagged.low_stock_alert_sent);

    // Once an address is configured the pending episode alerts
    monitor(pool, &state.notifications, Some("admin@store.test"))
        .check_inventory()
        .await
        .unwrap();
    assert!(rx.try_dequeue().is_some());
}

#[tokio::test]
async fn test_inactive_products_never_alert() {
    let (_dir, state, mut rx) = setup().await;
    let pool = &state.db.pool;
    let p = seed_product(pool, "Retired", 0, 5).await;
    product::deactivate(pool, p.id).await.unwrap();

    monitor(pool, &state.notifications, Some("admin@store.test"))
        .check_inventory()
        .await
        .unwrap();
    assert!(rx.try_dequeue().is_none());
}

#[tokio::test]
async fn test_settings_cache_defaults_and_write_through() {
    let (_dir, state, _rx) = setup().await;

    // Missing keys fall back to the provided default
    assert_eq!(
        state.settings.get_decimal(keys::SHIPPING_FEE, Decimal::new(499, 2)),
        Decimal::new(499, 2)
    );
    assert_eq!(state.settings.get_string("store.name", "Default Store"), "Default Store");

    // Write-through update refreshes the cache immediately
    state.settings.update(keys::SHIPPING_FEE, "7.50").await.unwrap();
    assert_eq!(
        state.settings.get_decimal(keys::SHIPPING_FEE, Decimal::ZERO),
        Decimal::new(750, 2)
    );

    // And survives a fresh load from the table
    state.settings.load().await.unwrap();
    assert_eq!(
        state.settings.get_decimal(keys::SHIPPING_FEE, Decimal::ZERO),
        Decimal::new(750, 2)
    );
}
