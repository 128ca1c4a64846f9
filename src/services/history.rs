//! Customer order history.

use std::sync::Arc;
use crate::domain::aggregates::OrderSummary;
use crate::store::OrderStore;
use crate::{Result, UserId};

#[derive(Clone)]
pub struct OrderHistory { orders: Arc<dyn OrderStore> }

impl OrderHistory {
    pub fn new(orders: Arc<dyn OrderStore>) -> Self { Self { orders } }

    pub async fn for_user(&self, user_id: UserId) -> Result<Vec<OrderSummary>> { self.orders.history(user_id).await }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{OrderLine, Product};
    use crate::domain::value_objects::{Money, Quantity};
    use crate::services::events::EventPublisher;
    use crate::services::ledger::OrderLedger;
    use crate::store::MemoryStore;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn history_shows_snapshots_not_current_catalog() {
        let store = MemoryStore::with_products([Product::new(7, "Mug", dec!(19.99), 5)]);
        let ledger = OrderLedger::new(Arc::new(store.clone()), Arc::new(store.clone()), EventPublisher::disabled());
        let line = OrderLine { product_id: 7, product_name: "Mug".into(), quantity: Quantity::new(2), unit_price: dec!(19.99) };
        ledger.create(1, vec![line], "addr", Money::new(dec!(44.98), "usd")).await.unwrap();

        store.upsert_product(Product::new(7, "Mug v2", dec!(25), 5)).await;

        let history = OrderHistory::new(Arc::new(store.clone())).for_user(1).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].items[0].product_name, "Mug");
        assert_eq!(history[0].items[0].unit_price, dec!(19.99));
        assert!(OrderHistory::new(Arc::new(store)).for_user(2).await.unwrap().is_empty());
    }
}
