//! 服务器状态
//!
//! [`AppState`] 持有所有服务的共享引用（Arc/池内部浅拷贝），并负责
//! 注册三个长期后台任务：通知 worker、过期订单 reaper、库存监控。

use std::sync::Arc;
use std::time::Duration;

use crate::core::{BackgroundTasks, Config, TaskKind};
use crate::db::DbService;
use crate::inventory::InventoryThresholdMonitor;
use crate::notify::{Mailer, NotificationQueue, NotificationReceiver, NotificationWorker};
use crate::orders::OrderExpiryReaper;
use crate::settings::SettingsService;
use crate::utils::{AppError, AppResult};

/// 服务器状态 - 持有配置、数据库、设置缓存与通知队列
#[derive(Clone, Debug)]
pub struct AppState {
    /// 服务器配置
    pub config: Config,
    /// SQLite 连接池
    pub db: DbService,
    /// 设置缓存
    pub settings: SettingsService,
    /// 通知队列（生产端）
    pub notifications: NotificationQueue,
}

impl AppState {
    /// 初始化服务器状态
    ///
    /// 按顺序初始化：工作目录 → 数据库（含迁移）→ 设置缓存 → 通知队列。
    /// 返回状态与通知队列的消费端（交给 worker）。
    pub async fn initialize(config: &Config) -> AppResult<(Self, NotificationReceiver)> {
        std::fs::create_dir_all(&config.work_dir)
            .map_err(|e| AppError::Internal(format!("Failed to create work dir: {e}")))?;

        let db = DbService::new(&config.database_path()).await?;

        let settings = SettingsService::new(db.pool.clone());
        settings.load().await?;

        let (notifications, receiver) = NotificationQueue::new();

        Ok((
            Self {
                config: config.clone(),
                db,
                settings,
                notifications,
            },
            receiver,
        ))
    }

    /// 注册并启动所有后台任务
    ///
    /// | 任务 | 类型 | 说明 |
    /// |------|------|------|
    /// | notification_worker | Worker | 单消费者通知投递循环 |
    /// | order_expiry_reaper | Periodic | 过期未付订单清理 |
    /// | inventory_monitor | Periodic | 低库存阈值告警 |
    pub fn start_background_tasks(
        &self,
        tasks: &mut BackgroundTasks,
        receiver: NotificationReceiver,
        mailer: Arc<dyn Mailer>,
    ) {
        let shutdown = tasks.shutdown_token();

        let worker = NotificationWorker::new(self.notifications.clone(), mailer);
        tasks.spawn(
            "notification_worker",
            TaskKind::Worker,
            worker.run(receiver, shutdown.clone()),
        );

        let reaper = OrderExpiryReaper::new(
            self.db.pool.clone(),
            Duration::from_secs(self.config.reaper_interval_minutes * 60),
            self.config.order_timeout_minutes,
            shutdown.clone(),
        );
        tasks.spawn("order_expiry_reaper", TaskKind::Periodic, reaper.run());

        let monitor = InventoryThresholdMonitor::new(
            self.db.pool.clone(),
            self.notifications.clone(),
            self.config.admin_email.clone(),
            Duration::from_secs(self.config.monitor_interval_minutes * 60),
            Duration::from_secs(self.config.monitor_startup_delay_secs),
            shutdown,
        );
        tasks.spawn("inventory_monitor", TaskKind::Periodic, monitor.run());

        tasks.log_summary();
    }
}
