//! Product Repository

use super::{RepoError, RepoResult};
use shared::models::{Product, ProductCreate, ProductUpdate};
use shared::util::{now_millis, snowflake_id};
use sqlx::{SqliteConnection, SqlitePool};

const PRODUCT_SELECT: &str = "SELECT id, name, description, price, stock, low_stock_threshold, low_stock_alert_sent, max_quantity_per_order, strict_stock_control, is_active, created_at, updated_at FROM product";

pub async fn find_all_active(pool: &SqlitePool) -> RepoResult<Vec<Product>> {
    let sql = format!("{} WHERE is_active = 1 ORDER BY name", PRODUCT_SELECT);
    let rows = sqlx::query_as::<_, Product>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Product>> {
    let sql = format!("{} WHERE id = ?", PRODUCT_SELECT);
    let row = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Transaction-scoped lookup, used while a checkout commit is in flight
pub async fn find_by_id_conn(
    conn: &mut SqliteConnection,
    id: i64,
) -> RepoResult<Option<Product>> {
    let sql = format!("{} WHERE id = ?", PRODUCT_SELECT);
    let row = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

pub async fn create(pool: &SqlitePool, data: ProductCreate) -> RepoResult<Product> {
    if data.price < 0.0 || !data.price.is_finite() {
        return Err(RepoError::Validation("price must be non-negative".into()));
    }
    let now = now_millis();
    let id = snowflake_id();
    sqlx::query(
        "INSERT INTO product (id, name, description, price, stock, low_stock_threshold, max_quantity_per_order, strict_stock_control, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
    )
    .bind(id)
    .bind(&data.name)
    .bind(&data.description)
    .bind(data.price)
    .bind(data.stock.unwrap_or(0))
    .bind(data.low_stock_threshold.unwrap_or(5))
    .bind(data.max_quantity_per_order)
    .bind(data.strict_stock_control.unwrap_or(false))
    .bind(now)
    .execute(pool)
    .await?;
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create product".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: ProductUpdate) -> RepoResult<Product> {
    let now = now_millis();
    let rows = sqlx::query(
        "UPDATE product SET name = COALESCE(?1, name), description = COALESCE(?2, description), price = COALESCE(?3, price), low_stock_threshold = COALESCE(?4, low_stock_threshold), max_quantity_per_order = COALESCE(?5, max_quantity_per_order), strict_stock_control = COALESCE(?6, strict_stock_control), is_active = COALESCE(?7, is_active), updated_at = ?8 WHERE id = ?9",
    )
    .bind(&data.name)
    .bind(&data.description)
    .bind(data.price)
    .bind(data.low_stock_threshold)
    .bind(data.max_quantity_per_order)
    .bind(data.strict_stock_control)
    .bind(data.is_active)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Product {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Product {id} not found")))
}

/// Soft-deactivate; products referenced by orders are never hard-deleted
pub async fn deactivate(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let now = now_millis();
    let rows = sqlx::query(
        "UPDATE product SET is_active = 0, updated_at = ? WHERE id = ? AND is_active = 1",
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() > 0)
}

/// Monitor pass 1: active products at or below threshold, not yet flagged
pub async fn find_low_stock_unalerted(pool: &SqlitePool) -> RepoResult<Vec<Product>> {
    let sql = format!(
        "{} WHERE is_active = 1 AND stock <= low_stock_threshold AND low_stock_alert_sent = 0",
        PRODUCT_SELECT
    );
    let rows = sqlx::query_as::<_, Product>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

/// Flag exactly the given batch after the alert was handed off successfully
pub async fn mark_alerts_sent(pool: &SqlitePool, ids: &[i64]) -> RepoResult<()> {
    if ids.is_empty() {
        return Ok(());
    }
    let now = now_millis();
    let placeholders = vec!["?"; ids.len()].join(", ");
    let sql = format!(
        "UPDATE product SET low_stock_alert_sent = 1, updated_at = ?1 WHERE id IN ({placeholders})"
    );
    let mut query = sqlx::query(&sql).bind(now);
    for id in ids {
        query = query.bind(id);
    }
    query.execute(pool).await?;
    Ok(())
}

/// Monitor pass 2: reset the hysteresis latch once stock recovered above the
/// threshold. Returns the number of products cleared.
pub async fn clear_alerts_recovered(pool: &SqlitePool) -> RepoResult<u64> {
    let now = now_millis();
    let rows = sqlx::query(
        "UPDATE product SET low_stock_alert_sent = 0, updated_at = ? WHERE stock > low_stock_threshold AND low_stock_alert_sent = 1",
    )
    .bind(now)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected())
}
