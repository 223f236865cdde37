//! 库存模块
//!
//! - [`ledger`]: 库存台账,所有 stock 变动的唯一入口,计数器与审计
//!   日志在同一事务内写入，不可能分叉
//! - [`monitor`]: 低库存阈值监控（滞回锁存告警）

pub mod ledger;
pub mod monitor;

pub use ledger::LedgerError;
pub use monitor::InventoryThresholdMonitor;
