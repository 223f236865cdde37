/// 服务器配置 - 订单管线的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | /var/lib/store | 工作目录（数据库、日志） |
/// | ENVIRONMENT | development | 运行环境 |
/// | ADMIN_EMAIL | (未设置) | 低库存告警收件地址 |
/// | ORDER_TIMEOUT_MINUTES | 60 | 未支付订单的过期时间 |
/// | REAPER_INTERVAL_MINUTES | 30 | 过期订单扫描间隔 |
/// | MONITOR_INTERVAL_MINUTES | 60 | 库存阈值扫描间隔 |
/// | MONITOR_STARTUP_DELAY_SECS | 30 | 库存扫描首轮延迟 |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/store ORDER_TIMEOUT_MINUTES=90 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库、日志等文件
    pub work_dir: String,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// 低库存告警的管理员地址（缺失时告警被跳过并记录）
    pub admin_email: Option<String>,
    /// 未支付卡订单的过期时间（分钟）
    pub order_timeout_minutes: i64,
    /// 过期订单扫描间隔（分钟）
    pub reaper_interval_minutes: u64,
    /// 库存阈值扫描间隔（分钟）
    pub monitor_interval_minutes: u64,
    /// 库存扫描首轮延迟（秒）
    pub monitor_startup_delay_secs: u64,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/store".into()),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            admin_email: std::env::var("ADMIN_EMAIL").ok().filter(|s| !s.is_empty()),
            order_timeout_minutes: std::env::var("ORDER_TIMEOUT_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
            reaper_interval_minutes: std::env::var("REAPER_INTERVAL_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            monitor_interval_minutes: std::env::var("MONITOR_INTERVAL_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
            monitor_startup_delay_secs: std::env::var("MONITOR_STARTUP_DELAY_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_work_dir(work_dir: impl Into<String>) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config
    }

    /// 数据库文件路径
    pub fn database_path(&self) -> String {
        format!("{}/store.db", self.work_dir)
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
