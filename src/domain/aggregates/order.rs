//! Order Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use crate::domain::value_objects::{Money, Quantity};
use crate::{EcommerceError, OrderId, ProductId, UserId};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus { #[default] Pending, Processing, Shipped, Completed, Cancelled, Refunded }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus { #[default] Unpaid, PaymentProcessing, PaymentSuccess, PaymentFailed, RefundProcessing, Refunded }

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
        }
    }
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::PaymentProcessing => "payment_processing",
            Self::PaymentSuccess => "payment_success",
            Self::PaymentFailed => "payment_failed",
            Self::RefundProcessing => "refund_processing",
            Self::Refunded => "refunded",
        }
    }

    /// Terminal for the normal update path: no status change is accepted afterwards.
    pub fn is_settled(&self) -> bool { *self == Self::PaymentSuccess }
}

impl FromStr for OrderStatus {
    type Err = UnknownStatus;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Self::Pending, Self::Processing, Self::Shipped, Self::Completed, Self::Cancelled, Self::Refunded]
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

impl FromStr for PaymentStatus {
    type Err = UnknownStatus;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Self::Unpaid, Self::PaymentProcessing, Self::PaymentSuccess, Self::PaymentFailed, Self::RefundProcessing, Self::Refunded]
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub struct UnknownStatus(pub String);
impl std::error::Error for UnknownStatus {}
impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "Unknown status '{}'", self.0) }
}

/// Partial update of an order's status columns. Absent fields are left untouched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OrderUpdate {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
}

impl OrderUpdate {
    pub fn new(status: Option<OrderStatus>, payment_status: Option<PaymentStatus>) -> Self { Self { status, payment_status } }

    /// The transition driven by a completed checkout session.
    pub fn payment_confirmed() -> Self { Self::new(Some(OrderStatus::Completed), Some(PaymentStatus::PaymentSuccess)) }

    pub fn is_empty(&self) -> bool { self.status.is_none() && self.payment_status.is_none() }
    pub fn settles_payment(&self) -> bool { self.payment_status.map_or(false, |p| p.is_settled()) }
}

/// Snapshot of a purchased product, frozen at order creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: Quantity,
    pub unit_price: Decimal,
}

impl OrderLine {
    pub fn subtotal(&self) -> Decimal { self.unit_price * Decimal::from(self.quantity.value()) }
}

/// A validated, not yet persisted order.
#[derive(Clone, Debug)]
pub struct NewOrder {
    user_id: UserId,
    lines: Vec<OrderLine>,
    shipping_address: String,
    total: Money,
}

impl NewOrder {
    pub fn new(user_id: UserId, lines: Vec<OrderLine>, shipping_address: &str, total: Money) -> crate::Result<Self> {
        if lines.is_empty() { return Err(EcommerceError::InvalidOrder("Cart is empty.".into())); }
        let shipping_address = shipping_address.trim();
        if shipping_address.is_empty() { return Err(EcommerceError::InvalidOrder("Shipping address is not entered.".into())); }
        if !total.is_positive() { return Err(EcommerceError::InvalidOrder("Total amount is invalid.".into())); }
        Ok(Self { user_id, lines, shipping_address: shipping_address.to_string(), total })
    }

    pub fn user_id(&self) -> UserId { self.user_id }
    pub fn lines(&self) -> &[OrderLine] { &self.lines }
    pub fn shipping_address(&self) -> &str { &self.shipping_address }
    pub fn total(&self) -> &Money { &self.total }

    /// Materialise the row as it looks right after insertion.
    pub fn into_order(self, id: OrderId) -> Order {
        Order {
            id, user_id: self.user_id, total: self.total.amount(),
            status: OrderStatus::Pending, payment_status: PaymentStatus::Unpaid,
            shipping_address: self.shipping_address, payment_session_id: None,
            lines: self.lines, created_at: Utc::now(), updated_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Order {
    id: OrderId,
    user_id: UserId,
    total: Decimal,
    status: OrderStatus,
    payment_status: PaymentStatus,
    shipping_address: String,
    payment_session_id: Option<String>,
    lines: Vec<OrderLine>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Order {
    pub fn id(&self) -> OrderId { self.id }
    pub fn user_id(&self) -> UserId { self.user_id }
    pub fn total(&self) -> Decimal { self.total }
    pub fn status(&self) -> OrderStatus { self.status }
    pub fn payment_status(&self) -> PaymentStatus { self.payment_status }
    pub fn shipping_address(&self) -> &str { &self.shipping_address }
    pub fn payment_session_id(&self) -> Option<&str> { self.payment_session_id.as_deref() }
    pub fn lines(&self) -> &[OrderLine] { &self.lines }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }

    pub fn is_owned_by(&self, user_id: UserId) -> bool { self.user_id == user_id }

    pub fn attach_session(&mut self, session_id: impl Into<String>) {
        self.payment_session_id = Some(session_id.into());
        self.touch();
    }

    /// Apply a status update. Returns `false` when nothing changed: either the
    /// update is empty or the payment has already settled.
    pub fn apply(&mut self, update: &OrderUpdate) -> bool {
        if update.is_empty() || self.payment_status.is_settled() { return false; }
        if let Some(status) = update.status { self.status = status; }
        if let Some(payment_status) = update.payment_status { self.payment_status = payment_status; }
        self.touch();
        true
    }

    pub fn summary(&self) -> OrderSummary {
        OrderSummary {
            id: self.id, total_price: self.total, status: self.status, payment_status: self.payment_status,
            created_at: self.created_at,
            items: self.lines.iter().map(|l| OrderItemView { product_name: l.product_name.clone(), quantity: l.quantity.value(), unit_price: l.unit_price }).collect(),
        }
    }

    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

/// Order as presented in a customer's order history.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub id: OrderId,
    pub total_price: Decimal,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItemView>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemView { pub product_name: String, pub quantity: u32, pub unit_price: Decimal }

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(qty: u32, price: Decimal) -> OrderLine {
        OrderLine { product_id: 7, product_name: "Mug".into(), quantity: Quantity::new(qty), unit_price: price }
    }

    fn pending_order() -> Order {
        NewOrder::new(1, vec![line(2, dec!(19.99))], "1-2-3 Chiyoda", Money::new(dec!(539.98), "jpy"))
            .unwrap()
            .into_order(uuid::Uuid::now_v7())
    }

    #[test]
    fn new_order_rejects_invalid_input() {
        let total = Money::new(dec!(10), "jpy");
        assert!(matches!(NewOrder::new(1, vec![], "addr", total.clone()), Err(EcommerceError::InvalidOrder(_))));
        assert!(matches!(NewOrder::new(1, vec![line(1, dec!(10))], "   ", total), Err(EcommerceError::InvalidOrder(_))));
        assert!(matches!(NewOrder::new(1, vec![line(1, dec!(10))], "addr", Money::zero("jpy")), Err(EcommerceError::InvalidOrder(_))));
    }

    #[test]
    fn new_order_starts_pending_and_unpaid() {
        let order = pending_order();
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.payment_status(), PaymentStatus::Unpaid);
        assert_eq!(order.shipping_address(), "1-2-3 Chiyoda");
        assert!(order.payment_session_id().is_none());
    }

    #[test]
    fn payment_success_is_one_shot() {
        let mut order = pending_order();
        assert!(order.apply(&OrderUpdate::payment_confirmed()));
        assert_eq!(order.status(), OrderStatus::Completed);
        assert_eq!(order.payment_status(), PaymentStatus::PaymentSuccess);

        assert!(!order.apply(&OrderUpdate::payment_confirmed()));
        assert!(!order.apply(&OrderUpdate::new(Some(OrderStatus::Refunded), Some(PaymentStatus::Refunded))));
        assert_eq!(order.status(), OrderStatus::Completed);
    }

    #[test]
    fn non_terminal_updates_are_partial() {
        let mut order = pending_order();
        assert!(!order.apply(&OrderUpdate::default()));
        assert!(order.apply(&OrderUpdate::new(None, Some(PaymentStatus::PaymentProcessing))));
        assert_eq!(order.status(), OrderStatus::Pending);
        assert!(order.apply(&OrderUpdate::new(Some(OrderStatus::Cancelled), Some(PaymentStatus::PaymentFailed))));
        assert_eq!(order.payment_status(), PaymentStatus::PaymentFailed);
    }

    #[test]
    fn status_strings_round_trip_through_storage_form() {
        assert_eq!("payment_success".parse::<PaymentStatus>(), Ok(PaymentStatus::PaymentSuccess));
        assert_eq!(OrderStatus::Shipped.as_str().parse::<OrderStatus>(), Ok(OrderStatus::Shipped));
        assert!("paid".parse::<PaymentStatus>().is_err());
    }
}
