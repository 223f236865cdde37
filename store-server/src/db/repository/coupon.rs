//! Coupon Repository
//!
//! `used_count` 的递增使用守卫条件，确保并发下不会超过 `max_usages`。

use super::{RepoError, RepoResult};
use shared::models::{Coupon, CouponKind};
use shared::util::{now_millis, snowflake_id};
use sqlx::{SqliteConnection, SqlitePool};

const COUPON_SELECT: &str = "SELECT id, code, kind, value, minimum_order_amount, max_usages, used_count, expires_at, is_active, created_at FROM coupon";

pub async fn create(
    pool: &SqlitePool,
    code: &str,
    kind: CouponKind,
    value: f64,
    minimum_order_amount: f64,
    max_usages: i64,
    expires_at: Option<i64>,
) -> RepoResult<Coupon> {
    let now = now_millis();
    let id = snowflake_id();
    sqlx::query(
        "INSERT INTO coupon (id, code, kind, value, minimum_order_amount, max_usages, expires_at, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )
    .bind(id)
    .bind(code)
    .bind(kind)
    .bind(value)
    .bind(minimum_order_amount)
    .bind(max_usages)
    .bind(expires_at)
    .bind(now)
    .execute(pool)
    .await?;
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create coupon".into()))
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Coupon>> {
    let sql = format!("{} WHERE id = ?", COUPON_SELECT);
    let row = sqlx::query_as::<_, Coupon>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Checkout lookup, transaction-scoped so validation and redemption see the
/// same row
pub async fn find_active_by_code(
    conn: &mut SqliteConnection,
    code: &str,
) -> RepoResult<Option<Coupon>> {
    let sql = format!("{} WHERE code = ? AND is_active = 1", COUPON_SELECT);
    let row = sqlx::query_as::<_, Coupon>(&sql)
        .bind(code)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

/// Record one redemption: guarded `used_count` increment plus a usage row,
/// both inside the caller's checkout transaction.
pub async fn redeem(
    conn: &mut SqliteConnection,
    coupon_id: i64,
    order_id: i64,
    email: &str,
) -> RepoResult<()> {
    let rows = sqlx::query(
        "UPDATE coupon SET used_count = used_count + 1 WHERE id = ?1 AND (max_usages = 0 OR used_count < max_usages)",
    )
    .bind(coupon_id)
    .execute(&mut *conn)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::Validation(format!(
            "Coupon {coupon_id} usage limit reached"
        )));
    }

    sqlx::query(
        "INSERT INTO coupon_usage (id, coupon_id, order_id, email, used_at) VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(snowflake_id())
    .bind(coupon_id)
    .bind(order_id)
    .bind(email)
    .bind(now_millis())
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn usages_for_coupon(pool: &SqlitePool, coupon_id: i64) -> RepoResult<i64> {
    let count: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM coupon_usage WHERE coupon_id = ?")
            .bind(coupon_id)
            .fetch_one(pool)
            .await?;
    Ok(count.0)
}
