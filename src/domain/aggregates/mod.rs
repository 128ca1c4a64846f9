//! Aggregates module
pub mod product;
pub mod order;
pub mod cart;

pub use product::{CatalogPrice, Product, StockLevel};
pub use order::{NewOrder, Order, OrderItemView, OrderLine, OrderStatus, OrderSummary, OrderUpdate, PaymentStatus};
pub use cart::{Cart, CartLine, PricedCart};
