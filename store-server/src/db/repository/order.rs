//! Order Repository
//!
//! 订单行快照在插入后不可变；状态流转一律使用带前置状态条件的
//! guarded UPDATE，零行受影响即为非法流转。

use super::RepoResult;
use shared::models::{Order, OrderItem, OrderStatus, PaymentStatus};
use shared::util::now_millis;
use sqlx::{SqliteConnection, SqlitePool};

const ORDER_SELECT: &str = "SELECT id, secret_token, customer_name, email, address, city, zip, phone_number, shipping_method, payment_method, status, payment_status, total_amount, discount_amount, shipping_fee, coupon_id, created_at, updated_at FROM orders";

const ITEM_SELECT: &str =
    "SELECT id, order_id, product_id, product_name, unit_price, quantity FROM order_item";

/// Insert a fully-built order row (id pre-assigned by the caller)
pub async fn insert(conn: &mut SqliteConnection, order: &Order) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO orders (id, secret_token, customer_name, email, address, city, zip, phone_number, shipping_method, payment_method, status, payment_status, total_amount, discount_amount, shipping_fee, coupon_id, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
    )
    .bind(order.id)
    .bind(&order.secret_token)
    .bind(&order.customer_name)
    .bind(&order.email)
    .bind(&order.address)
    .bind(&order.city)
    .bind(&order.zip)
    .bind(&order.phone_number)
    .bind(&order.shipping_method)
    .bind(&order.payment_method)
    .bind(order.status)
    .bind(order.payment_status)
    .bind(order.total_amount)
    .bind(order.discount_amount)
    .bind(order.shipping_fee)
    .bind(order.coupon_id)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn insert_item(conn: &mut SqliteConnection, item: &OrderItem) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO order_item (id, order_id, product_id, product_name, unit_price, quantity) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .bind(item.id)
    .bind(item.order_id)
    .bind(item.product_id)
    .bind(&item.product_name)
    .bind(item.unit_price)
    .bind(item.quantity)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Order>> {
    let sql = format!("{} WHERE id = ?", ORDER_SELECT);
    let row = sqlx::query_as::<_, Order>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Public order tracking lookup by opaque token
pub async fn find_by_token(pool: &SqlitePool, token: &str) -> RepoResult<Option<Order>> {
    let sql = format!("{} WHERE secret_token = ?", ORDER_SELECT);
    let row = sqlx::query_as::<_, Order>(&sql)
        .bind(token)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn items_for_order(pool: &SqlitePool, order_id: i64) -> RepoResult<Vec<OrderItem>> {
    let sql = format!("{} WHERE order_id = ? ORDER BY id", ITEM_SELECT);
    let rows = sqlx::query_as::<_, OrderItem>(&sql)
        .bind(order_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Transaction-scoped item listing (reaper reverses stock inside one tx)
pub async fn items_for_order_conn(
    conn: &mut SqliteConnection,
    order_id: i64,
) -> RepoResult<Vec<OrderItem>> {
    let sql = format!("{} WHERE order_id = ? ORDER BY id", ITEM_SELECT);
    let rows = sqlx::query_as::<_, OrderItem>(&sql)
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(rows)
}

/// Reaper predicate: unpaid orders of a given payment method older than
/// `cutoff` (Unix millis)
pub async fn find_expired_due(
    pool: &SqlitePool,
    payment_method: &str,
    cutoff: i64,
) -> RepoResult<Vec<Order>> {
    let sql = format!(
        "{} WHERE payment_method = ?1 AND payment_status = ?2 AND created_at < ?3 ORDER BY created_at",
        ORDER_SELECT
    );
    let rows = sqlx::query_as::<_, Order>(&sql)
        .bind(payment_method)
        .bind(PaymentStatus::Due)
        .bind(cutoff)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Guarded status transition: applies only when the order is still in
/// `from`. Returns false (no rows) for anything else; the caller reports
/// that as an invalid transition, never a silent apply.
pub async fn transition_status(
    pool: &SqlitePool,
    id: i64,
    from: OrderStatus,
    to: OrderStatus,
) -> RepoResult<bool> {
    let now = now_millis();
    let rows = sqlx::query(
        "UPDATE orders SET status = ?1, updated_at = ?2 WHERE id = ?3 AND status = ?4",
    )
    .bind(to)
    .bind(now)
    .bind(id)
    .bind(from)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() > 0)
}

/// Guarded flip Unprocessed/Due → Cancelled/Reversed, inside the caller's
/// transaction. The status recheck is what keeps overlapping reaper sweeps
/// idempotent.
pub async fn cancel_unpaid_guarded(conn: &mut SqliteConnection, id: i64) -> RepoResult<bool> {
    let now = now_millis();
    let rows = sqlx::query(
        "UPDATE orders SET status = ?1, payment_status = ?2, updated_at = ?3 WHERE id = ?4 AND status = ?5 AND payment_status = ?6",
    )
    .bind(OrderStatus::Cancelled)
    .bind(PaymentStatus::Reversed)
    .bind(now)
    .bind(id)
    .bind(OrderStatus::Unprocessed)
    .bind(PaymentStatus::Due)
    .execute(conn)
    .await?;
    Ok(rows.rows_affected() > 0)
}

/// Guarded Due → Paid after the gateway confirmed the session
pub async fn mark_paid_guarded(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let now = now_millis();
    let rows = sqlx::query(
        "UPDATE orders SET payment_status = ?1, updated_at = ?2 WHERE id = ?3 AND payment_status = ?4",
    )
    .bind(PaymentStatus::Paid)
    .bind(now)
    .bind(id)
    .bind(PaymentStatus::Due)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() > 0)
}
