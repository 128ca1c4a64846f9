//! Storefront order service
//!
//! Order lifecycle core of a storefront: checkout against trusted catalog
//! prices, hosted payment sessions, and webhook-driven reconciliation of
//! order and stock state.
//!
//! ## Features
//! - Checkout with server-side price and stock resolution
//! - Payment provider webhook verification and order confirmation
//! - One-shot stock/sales reconciliation per paid order
//! - Order history with snapshot line items

use thiserror::Error;

pub mod auth;
pub mod config;
pub mod domain;
pub mod http;
pub mod payment;
pub mod services;
pub mod store;

// =============================================================================
// Identifiers
// =============================================================================

pub type ProductId = i64;
pub type UserId = i64;
pub type OrderId = uuid::Uuid;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum EcommerceError {
    #[error("Items out of stock: {}", .0.join(", "))]
    OutOfStock(Vec<String>),

    #[error("Products not found.")]
    ProductsNotFound,

    #[error("Product ID {0} not found.")]
    ProductNotFound(ProductId),

    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    #[error("Failed to register order.")]
    OrderCreationFailed,

    #[error("Webhook signature verification failed: {0}")]
    InvalidSignature(String),

    #[error("Webhook does not contain order metadata.")]
    MissingOrderMetadata,

    #[error("Not authenticated.")]
    NotAuthenticated,

    #[error("{0}")]
    Validation(String),

    #[error("Payment provider error: {0}")]
    Payment(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, EcommerceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_stock_names_every_item() {
        let err = EcommerceError::OutOfStock(vec!["Mug".into(), "ID:9".into()]);
        assert_eq!(err.to_string(), "Items out of stock: Mug, ID:9");
    }
}
