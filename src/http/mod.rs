//! HTTP surface of the order core.

use axum::extract::FromRef;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use crate::auth::JwtKeys;
use crate::payment::{PaymentGateway, WebhookVerifier};
use crate::services::{CheckoutOrchestrator, CheckoutSettings, EventPublisher, OrderHistory, OrderLedger, PaymentConfirmationHandler};
use crate::store::{CatalogStore, OrderStore};

mod error;
mod handlers;

pub use error::{ApiError, SERVER_ERROR_MESSAGE};

#[derive(Clone)]
pub struct AppState {
    pub checkout: CheckoutOrchestrator,
    pub confirmation: PaymentConfirmationHandler,
    pub history: OrderHistory,
    pub jwt: JwtKeys,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self { state.jwt.clone() }
}

/// Collaborators the HTTP layer is assembled from.
pub struct Dependencies {
    pub catalog: Arc<dyn CatalogStore>,
    pub orders: Arc<dyn OrderStore>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub verifier: WebhookVerifier,
    pub events: EventPublisher,
    pub settings: CheckoutSettings,
    pub jwt: JwtKeys,
}

impl AppState {
    pub fn new(deps: Dependencies) -> Self {
        let ledger = OrderLedger::new(deps.orders.clone(), deps.catalog.clone(), deps.events);
        Self {
            checkout: CheckoutOrchestrator::new(deps.catalog, ledger.clone(), deps.gateway, deps.settings),
            confirmation: PaymentConfirmationHandler::new(deps.verifier, ledger),
            history: OrderHistory::new(deps.orders),
            jwt: deps.jwt,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "storefront"})) }))
        .route("/api/orders", get(handlers::list_orders))
        .route("/api/orders/checkout", post(handlers::checkout))
        .route("/api/orders/webhook", post(handlers::payment_webhook))
        .layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()).with_state(state)
}
