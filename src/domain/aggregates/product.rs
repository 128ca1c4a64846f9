//! Catalog entities as the order core sees them

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use crate::domain::value_objects::Quantity;
use crate::ProductId;

/// Stock as read during the pre-checkout availability check.
#[derive(Clone, Debug, PartialEq, Eq, sqlx::FromRow)]
pub struct StockLevel { pub name: String, pub stock: i64 }

/// Authoritative price of a product.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CatalogPrice { pub id: ProductId, pub name: String, pub price: Decimal }

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub stock: i64,
    pub sales_count: i64,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn new(id: ProductId, name: impl Into<String>, price: Decimal, stock: i64) -> Self {
        Self { id, name: name.into(), price, stock, sales_count: 0, updated_at: Utc::now() }
    }

    pub fn stock_level(&self) -> StockLevel { StockLevel { name: self.name.clone(), stock: self.stock } }
    pub fn catalog_price(&self) -> CatalogPrice { CatalogPrice { id: self.id, name: self.name.clone(), price: self.price } }

    /// Book a paid sale. Stock is not clamped at zero; callers see the
    /// resulting level and decide whether to report an oversell.
    pub fn record_sale(&mut self, qty: Quantity) -> i64 {
        let qty = i64::from(qty.value());
        self.stock -= qty;
        self.sales_count += qty;
        self.updated_at = Utc::now();
        self.stock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn record_sale_moves_stock_into_sales() {
        let mut p = Product::new(7, "Mug", dec!(19.99), 5);
        assert_eq!(p.record_sale(Quantity::new(2)), 3);
        assert_eq!(p.sales_count, 2);
        assert_eq!(p.record_sale(Quantity::new(4)), -1);
        assert_eq!(p.sales_count, 6);
    }
}
