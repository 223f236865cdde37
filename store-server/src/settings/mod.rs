//! Settings cache
//!
//! `settings` 表的内存缓存：按 key 查询字符串/小数并带默认值回退,
//! 管理端更新后写穿并重载。

use crate::db::repository::settings as settings_repo;
use crate::utils::AppResult;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

/// Well-known setting keys
pub mod keys {
    /// Flat shipping fee charged per order
    pub const SHIPPING_FEE: &str = "shipping.fee";
    /// Subtotal at or above which shipping is free (0 = no free tier)
    pub const FREE_SHIPPING_THRESHOLD: &str = "shipping.free_threshold";
}

/// Key→value lookup with default fallback, refreshed after administrative
/// updates
#[derive(Clone, Debug)]
pub struct SettingsService {
    pool: SqlitePool,
    cache: Arc<RwLock<HashMap<String, String>>>,
}

impl SettingsService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Load (or reload) the whole table into the cache
    pub async fn load(&self) -> AppResult<()> {
        let rows = settings_repo::load_all(&self.pool).await?;
        let map: HashMap<String, String> =
            rows.into_iter().map(|s| (s.key, s.value)).collect();
        let count = map.len();
        *self.cache.write() = map;
        tracing::debug!(count = count, "Settings cache loaded");
        Ok(())
    }

    pub fn get_string(&self, key: &str, default: &str) -> String {
        self.cache
            .read()
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    pub fn get_decimal(&self, key: &str, default: Decimal) -> Decimal {
        self.cache
            .read()
            .get(key)
            .and_then(|v| Decimal::from_str(v).ok())
            .unwrap_or(default)
    }

    /// Write-through update: persist, then refresh the cache
    pub async fn update(&self, key: &str, value: &str) -> AppResult<()> {
        settings_repo::upsert(&self.pool, key, value).await?;
        self.load().await
    }
}
