//! In-process stores. Same guard semantics as the SQL statements in
//! `postgres.rs`; used by tests and local demos.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;
use crate::domain::aggregates::{CatalogPrice, NewOrder, Order, OrderLine, OrderSummary, OrderUpdate, Product, StockLevel};
use crate::domain::value_objects::Quantity;
use crate::store::{CatalogStore, OrderStore};
use crate::{OrderId, ProductId, Result, UserId};

#[derive(Default)]
struct Inner {
    products: HashMap<ProductId, Product>,
    orders: Vec<Order>,
}

impl Inner {
    fn order_mut(&mut self, id: OrderId, user_id: UserId) -> Option<&mut Order> {
        self.orders.iter_mut().find(|o| o.id() == id && o.is_owned_by(user_id))
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore { inner: Arc<Mutex<Inner>> }

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let inner = Inner { products: products.into_iter().map(|p| (p.id, p)).collect(), orders: Vec::new() };
        Self { inner: Arc::new(Mutex::new(inner)) }
    }

    pub async fn upsert_product(&self, product: Product) { self.inner.lock().await.products.insert(product.id, product); }
    pub async fn product(&self, id: ProductId) -> Option<Product> { self.inner.lock().await.products.get(&id).cloned() }
    pub async fn order(&self, id: OrderId) -> Option<Order> { self.inner.lock().await.orders.iter().find(|o| o.id() == id).cloned() }
    pub async fn order_count(&self) -> usize { self.inner.lock().await.orders.len() }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn stock_level(&self, id: ProductId) -> Result<Option<StockLevel>> {
        Ok(self.inner.lock().await.products.get(&id).map(Product::stock_level))
    }

    async fn prices(&self, ids: &[ProductId]) -> Result<Vec<CatalogPrice>> {
        let inner = self.inner.lock().await;
        Ok(ids.iter().filter_map(|id| inner.products.get(id)).map(Product::catalog_price).collect())
    }

    async fn record_sale(&self, id: ProductId, qty: Quantity) -> Result<Option<i64>> {
        Ok(self.inner.lock().await.products.get_mut(&id).map(|p| p.record_sale(qty)))
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert(&self, order: &NewOrder) -> Result<Option<OrderId>> {
        let order = order.clone().into_order(Uuid::now_v7());
        let id = order.id();
        self.inner.lock().await.orders.push(order);
        Ok(Some(id))
    }

    async fn attach_session(&self, user_id: UserId, order_id: OrderId, session_id: &str) -> Result<u64> {
        let mut inner = self.inner.lock().await;
        match inner.order_mut(order_id, user_id) {
            Some(order) => { order.attach_session(session_id); Ok(1) }
            None => Ok(0),
        }
    }

    async fn update_status(&self, user_id: UserId, order_id: OrderId, update: &OrderUpdate) -> Result<u64> {
        let mut inner = self.inner.lock().await;
        let changed = inner.order_mut(order_id, user_id).map_or(false, |o| o.apply(update));
        Ok(u64::from(changed))
    }

    async fn lines(&self, order_id: OrderId) -> Result<Vec<OrderLine>> {
        Ok(self.inner.lock().await.orders.iter().find(|o| o.id() == order_id).map(|o| o.lines().to_vec()).unwrap_or_default())
    }

    async fn history(&self, user_id: UserId) -> Result<Vec<OrderSummary>> {
        let inner = self.inner.lock().await;
        let mut orders: Vec<&Order> = inner.orders.iter().rev().filter(|o| o.is_owned_by(user_id)).collect();
        orders.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(orders.into_iter().map(Order::summary).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::PaymentStatus;
    use crate::domain::value_objects::Money;
    use rust_decimal_macros::dec;

    fn new_order(user_id: UserId) -> NewOrder {
        let line = OrderLine { product_id: 7, product_name: "Mug".into(), quantity: Quantity::new(1), unit_price: dec!(10) };
        NewOrder::new(user_id, vec![line], "addr", Money::new(dec!(510), "jpy")).unwrap()
    }

    #[tokio::test]
    async fn update_is_scoped_to_owner() {
        let store = MemoryStore::new();
        let id = store.insert(&new_order(1)).await.unwrap().unwrap();
        assert_eq!(store.update_status(2, id, &OrderUpdate::payment_confirmed()).await.unwrap(), 0);
        assert_eq!(store.update_status(1, Uuid::now_v7(), &OrderUpdate::payment_confirmed()).await.unwrap(), 0);
        assert_eq!(store.update_status(1, id, &OrderUpdate::payment_confirmed()).await.unwrap(), 1);
        assert_eq!(store.update_status(1, id, &OrderUpdate::payment_confirmed()).await.unwrap(), 0);
        assert_eq!(store.order(id).await.unwrap().payment_status(), PaymentStatus::PaymentSuccess);
    }

    #[tokio::test]
    async fn history_only_lists_own_orders() {
        let store = MemoryStore::new();
        let first = store.insert(&new_order(1)).await.unwrap().unwrap();
        let second = store.insert(&new_order(1)).await.unwrap().unwrap();
        store.insert(&new_order(2)).await.unwrap();
        let history = store.history(1).await.unwrap();
        assert_eq!(history.iter().map(|o| o.id).collect::<Vec<_>>(), vec![second, first]);
    }
}
