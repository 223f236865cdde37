//! Stock Ledger
//!
//! The authoritative mutation path for `product.stock`. Both operations take
//! `&mut SqliteConnection` so they join the caller's transaction: an order
//! commit or a reaper cancellation either lands with its stock movement and
//! audit entry, or not at all.

use crate::db::repository::{RepoError, stock_log};
use shared::util::now_millis;
use sqlx::SqliteConnection;
use thiserror::Error;

/// Ledger error types
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Debit under strict stock control would drive the counter negative.
    /// Carries the stock available at decision time.
    #[error("Insufficient stock for product {product_id}: available {available}")]
    InsufficientStock { product_id: i64, available: i64 },

    #[error("Product {0} not found")]
    ProductNotFound(i64),

    #[error("Quantity must be positive, got {0}")]
    InvalidQuantity(i64),

    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        LedgerError::Repo(RepoError::from(err))
    }
}

/// Remove `qty` units. Under strict stock control the resulting value must
/// stay >= 0, otherwise the whole enclosing transaction is aborted via
/// [`LedgerError::InsufficientStock`].
pub async fn debit(
    conn: &mut SqliteConnection,
    product_id: i64,
    qty: i64,
    reason: &str,
) -> Result<i64, LedgerError> {
    if qty <= 0 {
        return Err(LedgerError::InvalidQuantity(qty));
    }
    apply(conn, product_id, -qty, reason).await
}

/// Return `qty` units (reaper reversal, manual restock correction)
pub async fn credit(
    conn: &mut SqliteConnection,
    product_id: i64,
    qty: i64,
    reason: &str,
) -> Result<i64, LedgerError> {
    if qty <= 0 {
        return Err(LedgerError::InvalidQuantity(qty));
    }
    apply(conn, product_id, qty, reason).await
}

/// Read-compute-write plus audit row, all on the caller's connection.
/// `resulting_stock` in the log is the value just written, never recomputed.
async fn apply(
    conn: &mut SqliteConnection,
    product_id: i64,
    delta: i64,
    reason: &str,
) -> Result<i64, LedgerError> {
    let row: Option<(i64, bool)> =
        sqlx::query_as("SELECT stock, strict_stock_control FROM product WHERE id = ?")
            .bind(product_id)
            .fetch_optional(&mut *conn)
            .await?;

    let (stock, strict) = row.ok_or(LedgerError::ProductNotFound(product_id))?;
    let resulting = stock + delta;

    if strict && resulting < 0 {
        return Err(LedgerError::InsufficientStock {
            product_id,
            available: stock,
        });
    }

    let now = now_millis();
    sqlx::query("UPDATE product SET stock = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(resulting)
        .bind(now)
        .bind(product_id)
        .execute(&mut *conn)
        .await?;

    stock_log::append(conn, product_id, delta, resulting, reason, now).await?;

    tracing::debug!(
        product_id = product_id,
        change = delta,
        resulting = resulting,
        reason = reason,
        "Stock ledger entry"
    );

    Ok(resulting)
}
