//! Stripe Checkout client

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{error, instrument};
use crate::payment::{CheckoutSession, CheckoutSessionRequest, PaymentGateway};
use crate::{EcommerceError, Result};

pub const DEFAULT_API_BASE: &str = "https://api.stripe.com";

#[derive(Clone)]
pub struct StripeGateway {
    http: reqwest::Client,
    api_base: String,
    secret_key: String,
}

#[derive(Deserialize)]
struct SessionResponse { id: String, url: Option<String> }

#[derive(Deserialize)]
struct ErrorEnvelope { error: ErrorBody }

#[derive(Deserialize)]
struct ErrorBody { message: Option<String> }

impl StripeGateway {
    pub fn new(secret_key: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self { http: reqwest::Client::new(), api_base: api_base.into().trim_end_matches('/').to_string(), secret_key: secret_key.into() }
    }

    /// Form fields in the provider's bracketed encoding.
    fn form(request: &CheckoutSessionRequest) -> Vec<(String, String)> {
        let mut form = vec![
            ("mode".to_string(), "payment".to_string()),
            ("success_url".to_string(), request.success_url.clone()),
            ("cancel_url".to_string(), request.cancel_url.clone()),
        ];
        if let Some(email) = &request.customer_email {
            form.push(("customer_email".into(), email.clone()));
        }
        for (key, value) in request.metadata() {
            form.push((format!("metadata[{key}]"), value));
        }
        for (i, item) in request.line_items.iter().enumerate() {
            form.push((format!("line_items[{i}][price_data][currency]"), request.currency.clone()));
            form.push((format!("line_items[{i}][price_data][product_data][name]"), item.name.clone()));
            form.push((format!("line_items[{i}][price_data][unit_amount]"), item.unit_amount.to_string()));
            form.push((format!("line_items[{i}][quantity]"), item.quantity.to_string()));
        }
        form
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    #[instrument(skip(self, request), fields(order_id = %request.order_id))]
    async fn create_checkout_session(&self, request: &CheckoutSessionRequest) -> Result<CheckoutSession> {
        let response = self.http
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&Self::form(request))
            .send().await
            .map_err(|e| EcommerceError::Payment(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.json::<ErrorEnvelope>().await.ok().and_then(|e| e.error.message).unwrap_or_else(|| status.to_string());
            error!(%status, %message, "Checkout session creation rejected");
            return Err(EcommerceError::Payment(message));
        }

        let session: SessionResponse = response.json().await.map_err(|e| EcommerceError::Payment(e.to_string()))?;
        let url = session.url.ok_or_else(|| EcommerceError::Payment(format!("session {} has no redirect url", session.id)))?;
        Ok(CheckoutSession { id: session.id, url })
    }
}
