//! Order event fan-out: always logged, published to NATS when connected.

use tracing::{info, warn};
use crate::domain::events::OrderEvent;

pub const SUBJECT_PREFIX: &str = "storefront.orders";

#[derive(Clone, Default)]
pub struct EventPublisher { nats: Option<async_nats::Client> }

impl EventPublisher {
    pub fn new(nats: Option<async_nats::Client>) -> Self { Self { nats } }

    /// Log-only publisher.
    pub fn disabled() -> Self { Self::default() }

    pub fn subject(event: &OrderEvent) -> String { format!("{}.{}", SUBJECT_PREFIX, event.kind()) }

    pub async fn publish(&self, event: OrderEvent) {
        info!(event = event.kind(), order_id = %event.order_id(), "Order event");
        let Some(nats) = &self.nats else { return };
        let payload = match serde_json::to_vec(&event) {
            Ok(p) => p,
            Err(e) => { warn!(error = %e, "Failed to encode order event"); return; }
        };
        if let Err(e) = nats.publish(Self::subject(&event), payload.into()).await {
            warn!(error = %e, event = event.kind(), "Failed to publish order event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_is_namespaced_by_kind() {
        let event = OrderEvent::PaymentConfirmed { order_id: uuid::Uuid::now_v7(), user_id: 1 };
        assert_eq!(EventPublisher::subject(&event), "storefront.orders.payment_confirmed");
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let event = OrderEvent::StockReconciled { order_id: uuid::Uuid::nil(), product_id: 7, quantity: 2, remaining: 3 };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "stock_reconciled");
        assert_eq!(json["remaining"], 3);
    }
}
