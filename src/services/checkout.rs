//! Checkout: trusted pricing, pending order, hosted payment session.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::{Validate, ValidationError};
use crate::domain::aggregates::{Cart, CartLine, PricedCart};
use crate::domain::value_objects::Money;
use crate::payment::{CheckoutSessionRequest, PaymentGateway, SessionLineItem};
use crate::services::ledger::OrderLedger;
use crate::store::CatalogStore;
use crate::{EcommerceError, OrderId, Result, UserId};

pub const SHIPPING_LINE_NAME: &str = "Shipping";

/// Body of `POST /api/orders/checkout`. Any price or name the client sends
/// alongside id and quantity is ignored.
#[derive(Debug, Deserialize, Validate)]
pub struct CheckoutRequest {
    #[validate(length(min = 1, message = "No products selected."), custom = "positive_quantities")]
    pub items: Vec<CartLine>,
    #[validate(length(min = 1, message = "Shipping address is not entered."))]
    pub address: String,
}

fn positive_quantities(items: &Vec<CartLine>) -> std::result::Result<(), ValidationError> {
    if items.iter().any(|i| i.quantity.is_zero()) {
        return Err(ValidationError::new("quantity_must_be_positive"));
    }
    Ok(())
}

impl CheckoutRequest {
    pub fn cart(&self) -> Cart { Cart::new(self.items.clone()) }
}

#[derive(Clone, Debug)]
pub struct CheckoutSettings {
    pub currency: String,
    pub shipping_fee: Decimal,
    pub success_url: String,
    pub cancel_url: String,
}

impl CheckoutSettings {
    pub fn new(base_url: &str, currency: &str, shipping_fee: Decimal) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            currency: currency.to_lowercase(),
            shipping_fee,
            success_url: format!("{base}/account?session_id={{CHECKOUT_SESSION_ID}}"),
            cancel_url: format!("{base}/order-confirm"),
        }
    }

    pub fn shipping(&self) -> Money { Money::new(self.shipping_fee, &self.currency) }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckoutOutcome {
    pub order_id: OrderId,
    pub session_id: String,
    pub url: String,
}

#[derive(Clone)]
pub struct CheckoutOrchestrator {
    catalog: Arc<dyn CatalogStore>,
    ledger: OrderLedger,
    gateway: Arc<dyn PaymentGateway>,
    settings: CheckoutSettings,
}

impl CheckoutOrchestrator {
    pub fn new(catalog: Arc<dyn CatalogStore>, ledger: OrderLedger, gateway: Arc<dyn PaymentGateway>, settings: CheckoutSettings) -> Self {
        Self { catalog, ledger, gateway, settings }
    }

    #[instrument(skip(self, email, cart, address), fields(lines = cart.lines().len()))]
    pub async fn checkout(&self, user_id: UserId, email: Option<&str>, cart: &Cart, address: &str) -> Result<CheckoutOutcome> {
        if cart.is_empty() { return Err(EcommerceError::InvalidOrder("Cart is empty.".into())); }

        let shortages = self.shortages(cart).await?;
        if !shortages.is_empty() {
            warn!(?shortages, "Checkout rejected for insufficient stock");
            return Err(EcommerceError::OutOfStock(shortages));
        }

        let prices = self.catalog.prices(&cart.product_ids()).await?;
        let priced = cart.price(&prices, &self.settings.shipping())?;
        let line_items = self.session_line_items(&priced)?;

        let order_id = self.ledger.create(user_id, priced.lines, address, priced.total).await?;

        let request = CheckoutSessionRequest {
            currency: self.settings.currency.clone(),
            line_items,
            customer_email: email.filter(|e| !e.is_empty()).map(str::to_string),
            success_url: self.settings.success_url.clone(),
            cancel_url: self.settings.cancel_url.clone(),
            order_id,
            user_id,
        };
        let session = self.gateway.create_checkout_session(&request).await?;
        self.ledger.attach_session(user_id, order_id, &session.id).await?;

        info!(%order_id, session_id = %session.id, "Checkout session opened");
        Ok(CheckoutOutcome { order_id, session_id: session.id, url: session.url })
    }

    /// Display names of every line the current stock cannot cover.
    async fn shortages(&self, cart: &Cart) -> Result<Vec<String>> {
        let mut shortages = Vec::new();
        for line in cart.lines() {
            match self.catalog.stock_level(line.id).await? {
                Some(level) if line.quantity.fits_within(level.stock) => {}
                Some(level) if !level.name.is_empty() => shortages.push(level.name),
                _ => shortages.push(format!("ID:{}", line.id)),
            }
        }
        Ok(shortages)
    }

    fn session_line_items(&self, priced: &PricedCart) -> Result<Vec<SessionLineItem>> {
        let minor = |m: &Money| m.minor_units().map_err(|e| EcommerceError::Payment(format!("{m}: {e}")));
        let mut items = priced.lines.iter()
            .map(|l| -> Result<SessionLineItem> { Ok(SessionLineItem { name: l.product_name.clone(), unit_amount: minor(&Money::new(l.unit_price, &self.settings.currency))?, quantity: l.quantity.value() }) })
            .collect::<Result<Vec<_>>>()?;
        items.push(SessionLineItem { name: SHIPPING_LINE_NAME.into(), unit_amount: minor(&priced.shipping)?, quantity: 1 });
        Ok(items)
    }
}
