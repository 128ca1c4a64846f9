//! Domain events
use rust_decimal::Decimal;
use serde::Serialize;
use crate::{OrderId, ProductId, UserId};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    Placed { order_id: OrderId, user_id: UserId, total: Decimal },
    CheckoutSessionOpened { order_id: OrderId, session_id: String },
    PaymentConfirmed { order_id: OrderId, user_id: UserId },
    StockReconciled { order_id: OrderId, product_id: ProductId, quantity: u32, remaining: i64 },
}

impl OrderEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Placed { .. } => "placed",
            Self::CheckoutSessionOpened { .. } => "checkout_session_opened",
            Self::PaymentConfirmed { .. } => "payment_confirmed",
            Self::StockReconciled { .. } => "stock_reconciled",
        }
    }

    pub fn order_id(&self) -> OrderId {
        match self {
            Self::Placed { order_id, .. }
            | Self::CheckoutSessionOpened { order_id, .. }
            | Self::PaymentConfirmed { order_id, .. }
            | Self::StockReconciled { order_id, .. } => *order_id,
        }
    }
}
