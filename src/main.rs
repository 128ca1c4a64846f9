//! Storefront order service

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use storefront::auth::JwtKeys;
use storefront::config::AppConfig;
use storefront::http::{router, AppState, Dependencies};
use storefront::payment::{StripeGateway, WebhookVerifier};
use storefront::services::{CheckoutSettings, EventPublisher};
use storefront::store::PgStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();
    let config = AppConfig::from_env()?;

    let db = PgPoolOptions::new().max_connections(config.db_max_connections).connect(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&db).await?;

    let nats = match &config.nats_url {
        Some(url) => match async_nats::connect(url.as_str()).await {
            Ok(client) => Some(client),
            Err(e) => { tracing::warn!(error = %e, "NATS unavailable; order events will only be logged"); None }
        },
        None => None,
    };

    let store = Arc::new(PgStore::new(db));
    let state = AppState::new(Dependencies {
        catalog: store.clone(),
        orders: store,
        gateway: Arc::new(StripeGateway::new(&config.stripe_secret_key, &config.stripe_api_base)),
        verifier: WebhookVerifier::new(&config.stripe_webhook_secret, config.webhook_tolerance_secs),
        events: EventPublisher::new(nats),
        settings: CheckoutSettings::new(&config.app_base_url, &config.currency, config.shipping_fee),
        jwt: JwtKeys::new(config.jwt_secret.as_bytes()),
    });

    tracing::info!("Storefront order service listening on 0.0.0.0:{}", config.port);
    axum::serve(tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?, router(state)).await?;
    Ok(())
}
