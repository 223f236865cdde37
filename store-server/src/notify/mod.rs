//! 通知模块
//!
//! 业务事务完成后不直接发信：通知意图进入进程内 FIFO 队列，由单一
//! worker 异步投递。投递失败的任务回到队尾重试（at-least-once）。

pub mod intent;
pub mod mailer;
pub mod queue;
pub mod worker;

pub use intent::{LowStockLine, Notification, OrderItemLine};
pub use mailer::{DeliveryError, LogMailer, Mailer};
pub use queue::{NotificationJob, NotificationQueue, NotificationReceiver};
pub use worker::NotificationWorker;
