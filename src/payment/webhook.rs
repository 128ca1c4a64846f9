//! Webhook signature verification and event decoding.
//!
//! Header format: `Stripe-Signature: t=<unix seconds>,v1=<hex hmac>[,v1=...]`.
//! The signed payload is `"<t>.<raw body>"`, keyed with the endpoint secret.

use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::collections::HashMap;
use crate::payment::{METADATA_ORDER_ID, METADATA_USER_ID};
use crate::{EcommerceError, OrderId, Result, UserId};

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "stripe-signature";
pub const CHECKOUT_SESSION_COMPLETED: &str = "checkout.session.completed";

#[derive(Clone)]
pub struct WebhookVerifier {
    secret: String,
    tolerance_secs: u64,
}

impl WebhookVerifier {
    pub fn new(secret: impl Into<String>, tolerance_secs: u64) -> Self {
        Self { secret: secret.into(), tolerance_secs }
    }

    pub fn construct_event(&self, payload: &[u8], signature_header: &str) -> Result<WebhookEvent> {
        self.construct_event_at(payload, signature_header, Utc::now().timestamp())
    }

    pub fn construct_event_at(&self, payload: &[u8], signature_header: &str, now: i64) -> Result<WebhookEvent> {
        let (timestamp, signatures) = parse_header(signature_header)?;
        if now.abs_diff(timestamp) > self.tolerance_secs {
            return Err(EcommerceError::InvalidSignature("timestamp outside the tolerance zone".into()));
        }

        let mac = self.mac(timestamp, payload)?;
        let matched = signatures.iter()
            .filter_map(|sig| hex::decode(sig).ok())
            .any(|sig| mac.clone().verify_slice(&sig).is_ok());
        if !matched {
            return Err(EcommerceError::InvalidSignature("no signatures found matching the expected signature".into()));
        }

        serde_json::from_slice(payload).map_err(|e| EcommerceError::InvalidSignature(format!("payload is not a valid event: {e}")))
    }

    /// Header value for `payload` signed at `timestamp`.
    pub fn sign(&self, payload: &[u8], timestamp: i64) -> Result<String> {
        let mac = self.mac(timestamp, payload)?;
        Ok(format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes())))
    }

    fn mac(&self, timestamp: i64, payload: &[u8]) -> Result<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes()).map_err(|e| EcommerceError::InvalidSignature(e.to_string()))?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        Ok(mac)
    }
}

fn parse_header(header: &str) -> Result<(i64, Vec<&str>)> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse::<i64>().ok(),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }
    let timestamp = timestamp.ok_or_else(|| EcommerceError::InvalidSignature("unable to extract timestamp from header".into()))?;
    if signatures.is_empty() {
        return Err(EcommerceError::InvalidSignature("no v1 signatures in header".into()));
    }
    Ok((timestamp, signatures))
}

#[derive(Clone, Debug, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EventData { pub object: serde_json::Value }

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct CompletedSession {
    pub id: String,
    #[serde(default)]
    pub metadata: Option<HashMap<String, String>>,
}

impl WebhookEvent {
    /// The completed checkout session, or `None` for any other event type.
    pub fn completed_session(&self) -> Result<Option<CompletedSession>> {
        if self.event_type != CHECKOUT_SESSION_COMPLETED { return Ok(None); }
        serde_json::from_value(self.data.object.clone()).map(Some).map_err(|_| EcommerceError::MissingOrderMetadata)
    }
}

impl CompletedSession {
    /// Order and owner as attached at checkout.
    pub fn order_ref(&self) -> Result<(OrderId, UserId)> {
        let metadata = self.metadata.as_ref().ok_or(EcommerceError::MissingOrderMetadata)?;
        let order_id = metadata.get(METADATA_ORDER_ID).and_then(|v| v.parse::<OrderId>().ok());
        let user_id = metadata.get(METADATA_USER_ID).and_then(|v| v.parse::<UserId>().ok());
        match (order_id, user_id) {
            (Some(order_id), Some(user_id)) => Ok((order_id, user_id)),
            _ => Err(EcommerceError::MissingOrderMetadata),
        }
    }
}
