//! Error responses: `{ "message": ... }` with a status derived from the error.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use crate::EcommerceError;

pub const SERVER_ERROR_MESSAGE: &str = "Server error occurred.";

#[derive(Debug)]
pub struct ApiError(pub EcommerceError);

impl From<EcommerceError> for ApiError {
    fn from(e: EcommerceError) -> Self { Self(e) }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            EcommerceError::OutOfStock(_)
            | EcommerceError::InvalidOrder(_)
            | EcommerceError::Validation(_)
            | EcommerceError::InvalidSignature(_)
            | EcommerceError::MissingOrderMetadata => StatusCode::BAD_REQUEST,
            EcommerceError::ProductsNotFound | EcommerceError::ProductNotFound(_) => StatusCode::NOT_FOUND,
            EcommerceError::NotAuthenticated => StatusCode::UNAUTHORIZED,
            EcommerceError::OrderCreationFailed
            | EcommerceError::Payment(_)
            | EcommerceError::Config(_)
            | EcommerceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show the client.
    pub fn message(&self) -> String {
        match &self.0 {
            EcommerceError::InvalidSignature(_) => "Webhook signature verification failed.".to_string(),
            _ if self.status().is_server_error() => SERVER_ERROR_MESSAGE.to_string(),
            e => e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        } else {
            tracing::debug!(error = %self.0, %status, "Request rejected");
        }
        (status, Json(json!({ "message": self.message() }))).into_response()
    }
}
