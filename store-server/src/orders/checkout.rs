//! Checkout commit
//!
//! 购物车 → 订单的原子转换。单笔事务内完成：商品权威快照校验、
//! 库存台账扣减、订单与行项目落库、优惠券核销。任何一行失败则
//! 整体回滚,不存在半个订单或半次扣减。
//!
//! 价格一律取自当前商品行,客户端提交的价格不可信。

use crate::cart::{CartError, CartLine};
use crate::db::repository::{RepoError, coupon, order, product};
use crate::inventory::ledger::{self, LedgerError};
use crate::notify::{Notification, NotificationQueue, OrderItemLine};
use crate::orders::money::{coupon_discount, order_total, to_decimal, to_f64};
use crate::settings::{SettingsService, keys};
use rust_decimal::Decimal;
use shared::models::{Coupon, CustomerInfo, Order, OrderItem, OrderStatus, PaymentStatus};
use shared::util::{now_millis, secret_token, snowflake_id};
use sqlx::SqlitePool;
use thiserror::Error;

/// Checkout failure. Business-rule rejections carry the same contextual data
/// as the cart layer so the caller can render them.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Product {0} unknown or no longer available")]
    UnknownProduct(i64),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error("Coupon rejected: {0}")]
    CouponRejected(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(err: sqlx::Error) -> Self {
        CheckoutError::Repo(RepoError::from(err))
    }
}

/// Commit a cart as an order.
///
/// On success the order row, its item snapshots, the stock debits with their
/// audit entries and any coupon redemption are all persisted in one
/// transaction, and an order-confirmation notification is enqueued.
pub async fn place_order(
    pool: &SqlitePool,
    settings: &SettingsService,
    queue: &NotificationQueue,
    lines: &[CartLine],
    customer: CustomerInfo,
    coupon_code: Option<&str>,
) -> Result<Order, CheckoutError> {
    if lines.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let mut tx = pool.begin().await?;
    let now = now_millis();
    let order_id = snowflake_id();

    // Authoritative product snapshots; the cart's copies may be stale
    let mut subtotal = Decimal::ZERO;
    let mut resolved = Vec::with_capacity(lines.len());
    for line in lines {
        let p = product::find_by_id_conn(&mut *tx, line.product.id)
            .await?
            .filter(|p| p.is_active)
            .ok_or(CheckoutError::UnknownProduct(line.product.id))?;

        if let Some(limit) = p.order_cap()
            && line.quantity > limit
        {
            return Err(CartError::QuantityLimitExceeded {
                in_cart: line.quantity,
                limit,
            }
            .into());
        }

        subtotal += to_decimal(p.price) * Decimal::from(line.quantity);
        resolved.push((p, line.quantity));
    }

    // Coupon validation against the in-transaction row
    let mut discount = Decimal::ZERO;
    let mut applied_coupon: Option<Coupon> = None;
    let mut free_shipping = false;
    if let Some(code) = coupon_code {
        let c = coupon::find_active_by_code(&mut *tx, code)
            .await?
            .ok_or_else(|| CheckoutError::CouponRejected(format!("unknown code {code}")))?;
        validate_coupon(&c, subtotal, now)?;
        match c.kind {
            shared::models::CouponKind::FreeShipping => free_shipping = true,
            _ => discount = coupon_discount(&c, subtotal),
        }
        applied_coupon = Some(c);
    }

    let shipping_fee = if free_shipping {
        Decimal::ZERO
    } else {
        shipping_fee_for(settings, subtotal)
    };

    let order = Order {
        id: order_id,
        secret_token: secret_token(),
        customer_name: customer.name,
        email: customer.email,
        address: customer.address,
        city: customer.city,
        zip: customer.zip,
        phone_number: customer.phone_number,
        shipping_method: customer.shipping_method,
        payment_method: customer.payment_method,
        status: OrderStatus::Unprocessed,
        payment_status: PaymentStatus::Due,
        total_amount: to_f64(order_total(subtotal, discount, shipping_fee)),
        discount_amount: to_f64(discount),
        shipping_fee: to_f64(shipping_fee),
        coupon_id: applied_coupon.as_ref().map(|c| c.id),
        created_at: now,
        updated_at: now,
    };
    order::insert(&mut *tx, &order).await?;

    if let Some(c) = &applied_coupon {
        coupon::redeem(&mut *tx, c.id, order_id, &order.email)
            .await
            .map_err(|e| match e {
                RepoError::Validation(msg) => CheckoutError::CouponRejected(msg),
                other => CheckoutError::Repo(other),
            })?;
    }

    // Debit stock and freeze item snapshots; the ledger aborts the whole
    // transaction if strict control would go negative
    let mut item_lines = Vec::with_capacity(resolved.len());
    for (p, quantity) in &resolved {
        ledger::debit(&mut *tx, p.id, *quantity, &format!("Order #{order_id}")).await?;
        let item = OrderItem {
            id: snowflake_id(),
            order_id,
            product_id: Some(p.id),
            product_name: p.name.clone(),
            unit_price: p.price,
            quantity: *quantity,
        };
        order::insert_item(&mut *tx, &item).await?;
        item_lines.push(OrderItemLine {
            name: item.product_name,
            quantity: item.quantity,
            unit_price: item.unit_price,
        });
    }

    tx.commit().await?;

    tracing::info!(
        order_id = order_id,
        total = order.total_amount,
        items = item_lines.len(),
        coupon = applied_coupon.as_ref().map(|c| c.code.as_str()),
        "Order committed"
    );

    queue.enqueue(Notification::OrderConfirmation {
        order_id,
        recipient: order.email.clone(),
        customer_name: order.customer_name.clone(),
        total_amount: order.total_amount,
        tracking_token: order.secret_token.clone(),
        items: item_lines,
    });

    Ok(order)
}

fn validate_coupon(c: &Coupon, subtotal: Decimal, now: i64) -> Result<(), CheckoutError> {
    if let Some(expires_at) = c.expires_at
        && expires_at < now
    {
        return Err(CheckoutError::CouponRejected(format!(
            "code {} expired",
            c.code
        )));
    }
    if subtotal < to_decimal(c.minimum_order_amount) {
        return Err(CheckoutError::CouponRejected(format!(
            "order below minimum amount {:.2}",
            c.minimum_order_amount
        )));
    }
    if c.max_usages > 0 && c.used_count >= c.max_usages {
        return Err(CheckoutError::CouponRejected(format!(
            "code {} usage limit reached",
            c.code
        )));
    }
    Ok(())
}

/// Flat fee from settings, waived above the configured free-shipping
/// threshold (0 = no free-shipping tier)
fn shipping_fee_for(settings: &SettingsService, subtotal: Decimal) -> Decimal {
    let threshold = settings.get_decimal(keys::FREE_SHIPPING_THRESHOLD, Decimal::ZERO);
    if threshold > Decimal::ZERO && subtotal >= threshold {
        return Decimal::ZERO;
    }
    settings.get_decimal(keys::SHIPPING_FEE, Decimal::ZERO)
}
