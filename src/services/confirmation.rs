//! Payment provider notifications.
//!
//! The signature is the only authentication on this path. Past it, every
//! outcome is acknowledged to the provider; failures are logged for operators.

use tracing::{error, info, instrument, warn};
use crate::domain::aggregates::OrderUpdate;
use crate::payment::WebhookVerifier;
use crate::services::ledger::OrderLedger;
use crate::{EcommerceError, OrderId, Result};

#[derive(Debug)]
pub enum WebhookOutcome {
    /// Event type this service does not act on.
    Ignored { event_type: String },
    /// Order update attempted; `affected == 0` means it had already settled.
    Applied { order_id: OrderId, affected: u64 },
    /// Accepted event that could not be processed.
    Failed(EcommerceError),
}

#[derive(Clone)]
pub struct PaymentConfirmationHandler {
    verifier: WebhookVerifier,
    ledger: OrderLedger,
}

impl PaymentConfirmationHandler {
    pub fn new(verifier: WebhookVerifier, ledger: OrderLedger) -> Self { Self { verifier, ledger } }

    /// `Err` only for authenticity failures; everything else is an outcome.
    #[instrument(skip_all, fields(bytes = payload.len()))]
    pub async fn handle(&self, payload: &[u8], signature: Option<&str>) -> Result<WebhookOutcome> {
        let event = self.verifier.construct_event(payload, signature.unwrap_or_default()).map_err(|e| {
            warn!(error = %e, "Webhook rejected");
            e
        })?;

        let session = match event.completed_session() {
            Ok(Some(session)) => session,
            Ok(None) => {
                info!(event_id = %event.id, event_type = %event.event_type, "Webhook event ignored");
                return Ok(WebhookOutcome::Ignored { event_type: event.event_type });
            }
            Err(e) => return Ok(Self::failed(e)),
        };

        let (order_id, user_id) = match session.order_ref() {
            Ok(r) => r,
            Err(e) => return Ok(Self::failed(e)),
        };
        info!(event_id = %event.id, session_id = %session.id, %order_id, user_id, "Checkout session completed");

        match self.ledger.update(user_id, order_id, OrderUpdate::payment_confirmed()).await {
            Ok(affected) => Ok(WebhookOutcome::Applied { order_id, affected }),
            Err(e) => Ok(Self::failed(e)),
        }
    }

    fn failed(e: EcommerceError) -> WebhookOutcome {
        error!(error = %e, "Webhook event could not be processed");
        WebhookOutcome::Failed(e)
    }
}
