//! Stock Log Repository
//!
//! Append-only; rows are written by the stock ledger in the same transaction
//! as the counter update.

use super::RepoResult;
use shared::models::StockLogEntry;
use sqlx::{SqliteConnection, SqlitePool};

pub async fn append(
    conn: &mut SqliteConnection,
    product_id: i64,
    change_amount: i64,
    resulting_stock: i64,
    reason: &str,
    created_at: i64,
) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO stock_log (product_id, change_amount, resulting_stock, reason, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(product_id)
    .bind(change_amount)
    .bind(resulting_stock)
    .bind(reason)
    .bind(created_at)
    .execute(conn)
    .await?;
    Ok(())
}

/// Audit trail for one product, newest first (reporting tooling)
pub async fn list_by_product(
    pool: &SqlitePool,
    product_id: i64,
    limit: i64,
) -> RepoResult<Vec<StockLogEntry>> {
    let rows = sqlx::query_as::<_, StockLogEntry>(
        "SELECT id, product_id, change_amount, resulting_stock, reason, created_at FROM stock_log WHERE product_id = ? ORDER BY id DESC LIMIT ?",
    )
    .bind(product_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
