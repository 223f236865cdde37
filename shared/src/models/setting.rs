//! Site Setting Model

use serde::{Deserialize, Serialize};

/// Key→value store row backing the settings cache
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Setting {
    pub key: String,
    pub value: String,
}
