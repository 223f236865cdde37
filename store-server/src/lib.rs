//! Store Server - 在线商店订单管线引擎
//!
//! # 架构概述
//!
//! 本模块实现订单生命周期与库存一致性引擎：
//!
//! - **购物车** (`cart`): 限购/库存校验，变更通知
//! - **订单** (`orders`): 原子下单、状态机、过期清理
//! - **库存** (`inventory`): 库存台账（计数器 + 审计日志）、阈值监控
//! - **通知** (`notify`): 进程内 at-least-once 投递队列
//! - **数据库** (`db`): SQLite (WAL) 存储
//!
//! # 模块结构
//!
//! ```text
//! store-server/src/
//! ├── core/       # 配置、状态、后台任务
//! ├── cart/       # 会话级购物车
//! ├── orders/     # 下单、状态机、reaper
//! ├── inventory/  # 库存台账、阈值监控
//! ├── notify/     # 通知队列与 worker
//! ├── payment/    # 支付网关接口
//! ├── settings/   # 键值设置缓存
//! ├── db/         # 数据库层
//! └── utils/      # 错误、日志
//! ```

pub mod cart;
pub mod core;
pub mod db;
pub mod inventory;
pub mod notify;
pub mod orders;
pub mod payment;
pub mod settings;
pub mod utils;

// Re-export 公共类型
pub use crate::core::{AppState, BackgroundTasks, Config, TaskKind};
pub use cart::{Cart, CartError, CartLine, CartObserver};
pub use db::DbService;
pub use inventory::{InventoryThresholdMonitor, LedgerError};
pub use notify::{
    DeliveryError, LogMailer, Mailer, Notification, NotificationQueue, NotificationWorker,
};
pub use orders::{CheckoutError, OrderExpiryReaper, TransitionError};
pub use payment::{CheckoutSession, PaymentError, PaymentGateway};
pub use settings::SettingsService;
pub use utils::{AppError, AppResult, init_logger, init_logger_with_file};
