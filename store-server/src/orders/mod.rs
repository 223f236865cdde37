//! 订单领域
//!
//! - [`money`]: Decimal 精确货币运算
//! - [`checkout`]: 购物车到订单的原子提交（库存扣减、优惠券、运费）
//! - [`lifecycle`]: 状态机流转与支付确认
//! - [`reaper`]: 过期未付订单的定时清理与库存回补

pub mod checkout;
pub mod lifecycle;
pub mod money;
pub mod reaper;

pub use checkout::{CheckoutError, place_order};
pub use lifecycle::{TransitionError, advance, cancel_order, confirm_payment};
pub use reaper::OrderExpiryReaper;
