//! 统一错误处理
//!
//! 服务层错误枚举。业务规则拒绝（购物车、状态机）使用各自的
//! 专用错误类型并携带上下文数据；这里是它们之上的汇聚点。
//!
//! | 分类 | 说明 |
//! |------|------|
//! | 业务逻辑错误 | 资源不存在、验证失败、规则冲突 |
//! | 系统错误 | 数据库错误、内部错误、配置缺失 |

use crate::db::repository::RepoError;

/// 应用错误枚举
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ========== 业务逻辑错误 ==========
    #[error("Resource not found: {0}")]
    /// 资源不存在
    NotFound(String),

    #[error("Resource already exists: {0}")]
    /// 资源冲突
    Conflict(String),

    #[error("Validation failed: {0}")]
    /// 验证失败
    Validation(String),

    #[error("Business rule violation: {0}")]
    /// 业务规则违反
    BusinessRule(String),

    // ========== 系统错误 ==========
    #[error("Database error: {0}")]
    /// 数据库错误
    Database(String),

    #[error("Internal server error: {0}")]
    /// 内部错误
    Internal(String),

    #[error("Configuration error: {0}")]
    /// 配置缺失或无效
    Config(String),
}

impl AppError {
    /// Create a database error from anything displayable
    pub fn database(msg: impl std::fmt::Display) -> Self {
        AppError::Database(msg.to_string())
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => AppError::NotFound(msg),
            RepoError::Duplicate(msg) => AppError::Conflict(msg),
            RepoError::Validation(msg) => AppError::Validation(msg),
            RepoError::Database(msg) => AppError::Database(msg),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

/// Result type for service operations
pub type AppResult<T> = Result<T, AppError>;
