//! Settings Repository

use super::RepoResult;
use shared::models::Setting;
use sqlx::SqlitePool;

pub async fn load_all(pool: &SqlitePool) -> RepoResult<Vec<Setting>> {
    let rows = sqlx::query_as::<_, Setting>("SELECT key, value FROM settings")
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn upsert(pool: &SqlitePool, key: &str, value: &str) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?1, ?2) ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;
    Ok(())
}
