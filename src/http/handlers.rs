//! Request handlers for the order endpoints.

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde_json::{json, Value};
use validator::{Validate, ValidationErrors};
use crate::auth::AuthUser;
use crate::http::{ApiError, AppState};
use crate::payment::webhook::SIGNATURE_HEADER;
use crate::services::CheckoutRequest;
use crate::EcommerceError;

/// Fields checked in this order, so the cart problem is reported before the address.
const FIELD_PRIORITY: [&str; 2] = ["items", "address"];

fn validation_message(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by_key(|(name, _)| (FIELD_PRIORITY.iter().position(|p| p == name).unwrap_or(FIELD_PRIORITY.len()), *name));
    fields.into_iter()
        .flat_map(|(_, errs)| errs.iter())
        .map(|e| e.message.as_ref().map(|m| m.to_string()).unwrap_or_else(|| e.code.to_string()))
        .next()
        .unwrap_or_else(|| errors.to_string())
}

pub async fn checkout(State(s): State<AppState>, user: AuthUser, body: Result<Json<CheckoutRequest>, JsonRejection>) -> Result<Json<Value>, ApiError> {
    let Json(request) = body.map_err(|e| EcommerceError::Validation(e.body_text()))?;
    request.validate().map_err(|e| EcommerceError::Validation(validation_message(&e)))?;
    let outcome = s.checkout.checkout(user.user_id, Some(user.email.as_str()), &request.cart(), &request.address).await?;
    Ok(Json(json!({ "url": outcome.url })))
}

pub async fn payment_webhook(State(s): State<AppState>, headers: HeaderMap, body: Bytes) -> Result<Json<Value>, ApiError> {
    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    s.confirmation.handle(&body, signature).await?;
    Ok(Json(json!({ "received": true })))
}

pub async fn list_orders(State(s): State<AppState>, user: AuthUser) -> Result<Json<Value>, ApiError> {
    let orders = s.history.for_user(user.user_id).await?;
    Ok(Json(json!({ "orders": orders })))
}
