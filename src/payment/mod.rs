//! Hosted payment provider integration

use async_trait::async_trait;
use crate::{OrderId, Result, UserId};

pub mod stripe;
pub mod webhook;

pub use stripe::StripeGateway;
pub use webhook::{CompletedSession, WebhookEvent, WebhookVerifier, CHECKOUT_SESSION_COMPLETED};

/// Metadata keys carried through the provider and read back in the webhook.
pub const METADATA_ORDER_ID: &str = "orderId";
pub const METADATA_USER_ID: &str = "userId";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionLineItem {
    pub name: String,
    /// Minor units of `CheckoutSessionRequest::currency`.
    pub unit_amount: i64,
    pub quantity: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckoutSessionRequest {
    pub currency: String,
    pub line_items: Vec<SessionLineItem>,
    pub customer_email: Option<String>,
    pub success_url: String,
    pub cancel_url: String,
    pub order_id: OrderId,
    pub user_id: UserId,
}

impl CheckoutSessionRequest {
    pub fn metadata(&self) -> [(&'static str, String); 2] {
        [(METADATA_ORDER_ID, self.order_id.to_string()), (METADATA_USER_ID, self.user_id.to_string())]
    }

    pub fn amount_total(&self) -> i64 {
        self.line_items.iter().map(|l| l.unit_amount * i64::from(l.quantity)).sum()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_checkout_session(&self, request: &CheckoutSessionRequest) -> Result<CheckoutSession>;
}
