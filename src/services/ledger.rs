//! Order ledger and stock reconciliation.

use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use crate::domain::aggregates::{NewOrder, OrderLine, OrderUpdate};
use crate::domain::events::OrderEvent;
use crate::domain::value_objects::Money;
use crate::services::events::EventPublisher;
use crate::store::{CatalogStore, OrderStore};
use crate::{EcommerceError, OrderId, Result, UserId};

/// Owns order and order-line records and their status columns.
#[derive(Clone)]
pub struct OrderLedger {
    orders: Arc<dyn OrderStore>,
    reconciler: StockReconciler,
    events: EventPublisher,
}

impl OrderLedger {
    pub fn new(orders: Arc<dyn OrderStore>, catalog: Arc<dyn CatalogStore>, events: EventPublisher) -> Self {
        let reconciler = StockReconciler::new(orders.clone(), catalog, events.clone());
        Self { orders, reconciler, events }
    }

    /// Persist a pending, unpaid order with snapshot lines.
    #[instrument(skip(self, lines, address, total), fields(lines = lines.len()))]
    pub async fn create(&self, user_id: UserId, lines: Vec<OrderLine>, address: &str, total: Money) -> Result<OrderId> {
        let order = NewOrder::new(user_id, lines, address, total)?;
        let order_id = self.orders.insert(&order).await?.ok_or(EcommerceError::OrderCreationFailed)?;
        info!(%order_id, total = %order.total(), "Order registered");
        self.events.publish(OrderEvent::Placed { order_id, user_id, total: order.total().amount() }).await;
        Ok(order_id)
    }

    pub async fn attach_session(&self, user_id: UserId, order_id: OrderId, session_id: &str) -> Result<u64> {
        let affected = self.orders.attach_session(user_id, order_id, session_id).await?;
        if affected == 0 {
            warn!(%order_id, user_id, "Payment session could not be linked to order");
        } else {
            self.events.publish(OrderEvent::CheckoutSessionOpened { order_id, session_id: session_id.to_string() }).await;
        }
        Ok(affected)
    }

    /// Apply a status update scoped to the owner. Once an order's payment has
    /// settled this is a no-op. Settling the payment books the stock exactly once.
    #[instrument(skip(self))]
    pub async fn update(&self, user_id: UserId, order_id: OrderId, update: OrderUpdate) -> Result<u64> {
        if update.is_empty() { return Ok(0); }
        let affected = self.orders.update_status(user_id, order_id, &update).await?;
        if affected == 0 {
            info!("Order update skipped: unknown order, foreign owner, or payment already settled");
            return Ok(0);
        }
        if update.settles_payment() {
            self.events.publish(OrderEvent::PaymentConfirmed { order_id, user_id }).await;
            self.reconciler.reconcile(order_id).await;
        }
        Ok(affected)
    }
}

/// Moves purchased quantities out of stock and into sales counters.
///
/// Each line is booked independently; a failing line is logged and the rest
/// still run. There is no rollback: the payment has already been captured.
#[derive(Clone)]
pub struct StockReconciler {
    orders: Arc<dyn OrderStore>,
    catalog: Arc<dyn CatalogStore>,
    events: EventPublisher,
}

impl StockReconciler {
    pub fn new(orders: Arc<dyn OrderStore>, catalog: Arc<dyn CatalogStore>, events: EventPublisher) -> Self {
        Self { orders, catalog, events }
    }

    /// Returns the number of lines booked.
    #[instrument(skip(self))]
    pub async fn reconcile(&self, order_id: OrderId) -> usize {
        let lines = match self.orders.lines(order_id).await {
            Ok(lines) => lines,
            Err(e) => { error!(error = %e, "Failed to load order lines for stock reconciliation"); return 0; }
        };

        let mut booked = 0;
        for line in lines {
            match self.catalog.record_sale(line.product_id, line.quantity).await {
                Ok(Some(remaining)) => {
                    if remaining < 0 {
                        warn!(product_id = line.product_id, remaining, "Stock oversold");
                    }
                    booked += 1;
                    self.events.publish(OrderEvent::StockReconciled { order_id, product_id: line.product_id, quantity: line.quantity.value(), remaining }).await;
                }
                Ok(None) => warn!(product_id = line.product_id, "Ordered product no longer exists; stock not adjusted"),
                Err(e) => error!(product_id = line.product_id, error = %e, "Failed to adjust stock"),
            }
        }
        booked
    }
}
