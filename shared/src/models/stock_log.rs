//! Stock Log Model

use serde::{Deserialize, Serialize};

/// Append-only audit record of a stock mutation
///
/// `resulting_stock` is the value just written by the mutation, recorded in
/// the same transaction, never recomputed later.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct StockLogEntry {
    pub id: i64,
    /// Nullable so the audit trail survives product deletion
    pub product_id: Option<i64>,
    /// Signed delta: positive = credit, negative = debit
    pub change_amount: i64,
    pub resulting_stock: i64,
    pub reason: String,
    pub created_at: i64,
}
