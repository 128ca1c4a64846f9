//! Cart Aggregate
//!
//! The cart arrives from the browser and is untrusted: only product ids and
//! quantities are read from it. Names and prices always come from the catalog.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use crate::domain::aggregates::order::OrderLine;
use crate::domain::aggregates::product::CatalogPrice;
use crate::domain::value_objects::{Money, Quantity};
use crate::{EcommerceError, ProductId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: ProductId,
    pub quantity: Quantity,
}

#[derive(Clone, Debug, Default)]
pub struct Cart { lines: Vec<CartLine> }

impl Cart {
    pub fn new(lines: Vec<CartLine>) -> Self { Self { lines } }
    pub fn lines(&self) -> &[CartLine] { &self.lines }
    pub fn is_empty(&self) -> bool { self.lines.is_empty() }

    /// Distinct product ids, in first-seen order.
    pub fn product_ids(&self) -> Vec<ProductId> {
        let mut ids = Vec::with_capacity(self.lines.len());
        for line in &self.lines {
            if !ids.contains(&line.id) { ids.push(line.id); }
        }
        ids
    }

    /// Price every line from the catalog and add the shipping surcharge.
    pub fn price(&self, catalog: &[CatalogPrice], shipping: &Money) -> crate::Result<PricedCart> {
        if catalog.is_empty() { return Err(EcommerceError::ProductsNotFound); }
        let by_id: HashMap<ProductId, &CatalogPrice> = catalog.iter().map(|p| (p.id, p)).collect();

        let mut subtotal = Money::zero(shipping.currency());
        let mut lines = Vec::with_capacity(self.lines.len());
        for item in &self.lines {
            let product = by_id.get(&item.id).ok_or(EcommerceError::ProductNotFound(item.id))?;
            let unit_price = Money::new(product.price, shipping.currency());
            subtotal = subtotal.add(&unit_price.multiply(item.quantity)).map_err(|e| EcommerceError::InvalidOrder(e.to_string()))?;
            lines.push(OrderLine { product_id: product.id, product_name: product.name.clone(), quantity: item.quantity, unit_price: product.price });
        }
        let total = subtotal.add(shipping).map_err(|e| EcommerceError::InvalidOrder(e.to_string()))?;
        Ok(PricedCart { lines, subtotal, shipping: shipping.clone(), total })
    }
}

/// Cart lines re-priced against the catalog.
#[derive(Clone, Debug)]
pub struct PricedCart {
    pub lines: Vec<OrderLine>,
    pub subtotal: Money,
    pub shipping: Money,
    pub total: Money,
}
