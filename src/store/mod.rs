//! Persistence seams for the order core.
//!
//! Both traits map one-to-one onto single SQL statements (or one transaction
//! for order insertion). Consistency across calls is not promised: callers
//! must not assume a stock level read earlier still holds.

use async_trait::async_trait;
use crate::domain::aggregates::{CatalogPrice, NewOrder, OrderLine, OrderSummary, OrderUpdate, StockLevel};
use crate::domain::value_objects::Quantity;
use crate::{OrderId, ProductId, Result, UserId};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn stock_level(&self, id: ProductId) -> Result<Option<StockLevel>>;

    /// Batch price lookup. Unknown ids are silently absent from the result.
    async fn prices(&self, ids: &[ProductId]) -> Result<Vec<CatalogPrice>>;

    /// Decrement stock and bump the sales counter by `qty`.
    /// Returns the remaining stock, or `None` if the product does not exist.
    async fn record_sale(&self, id: ProductId, qty: Quantity) -> Result<Option<i64>>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert the order and its lines atomically. `None` means no id came back.
    async fn insert(&self, order: &NewOrder) -> Result<Option<OrderId>>;

    async fn attach_session(&self, user_id: UserId, order_id: OrderId, session_id: &str) -> Result<u64>;

    /// Apply `update` to the order scoped by id and owner, unless its payment
    /// has already settled. Returns the number of rows changed.
    async fn update_status(&self, user_id: UserId, order_id: OrderId, update: &OrderUpdate) -> Result<u64>;

    async fn lines(&self, order_id: OrderId) -> Result<Vec<OrderLine>>;

    /// Orders of a user, newest first.
    async fn history(&self, user_id: UserId) -> Result<Vec<OrderSummary>>;
}
