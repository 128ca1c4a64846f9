//! Environment-driven configuration.

use rust_decimal::Decimal;
use std::env;
use crate::domain::value_objects::Money;
use crate::payment::stripe::DEFAULT_API_BASE;
use crate::{EcommerceError, Result};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub port: u16,
    pub app_base_url: String,
    pub stripe_secret_key: String,
    pub stripe_webhook_secret: String,
    pub stripe_api_base: String,
    pub webhook_tolerance_secs: u64,
    pub jwt_secret: String,
    pub currency: String,
    pub shipping_fee: Decimal,
    pub nats_url: Option<String>,
}

impl AppConfig {
    /// Reads `.env` if present, then the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| get(key).filter(|v| !v.is_empty()).ok_or_else(|| EcommerceError::Config(format!("Environment variable {key} is not set.")));
        let or_default = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let port = or_default("PORT", "8083").parse::<u16>().map_err(|e| EcommerceError::Config(format!("Invalid PORT: {e}")))?;
        let currency = or_default("CURRENCY", "usd").to_lowercase();
        let shipping_fee = or_default("SHIPPING_FEE", "5.00").parse::<Decimal>().map_err(|e| EcommerceError::Config(format!("Invalid SHIPPING_FEE: {e}")))?;
        if shipping_fee.is_sign_negative() {
            return Err(EcommerceError::Config("SHIPPING_FEE must not be negative".into()));
        }
        Money::new(shipping_fee, &currency).minor_units()
            .map_err(|e| EcommerceError::Config(format!("Invalid SHIPPING_FEE for {currency}: {e}")))?;

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            db_max_connections: or_default("DB_MAX_CONNECTIONS", "10").parse::<u32>().map_err(|e| EcommerceError::Config(format!("Invalid DB_MAX_CONNECTIONS: {e}")))?,
            port,
            app_base_url: get("APP_BASE_URL").unwrap_or_else(|| format!("http://localhost:{port}")),
            stripe_secret_key: required("STRIPE_SECRET_KEY")?,
            stripe_webhook_secret: required("STRIPE_WEBHOOK_SECRET")?,
            stripe_api_base: or_default("STRIPE_API_BASE", DEFAULT_API_BASE),
            webhook_tolerance_secs: or_default("WEBHOOK_TOLERANCE_SECS", "300").parse::<u64>().map_err(|e| EcommerceError::Config(format!("Invalid WEBHOOK_TOLERANCE_SECS: {e}")))?,
            jwt_secret: required("JWT_SECRET")?,
            currency,
            shipping_fee,
            nats_url: get("NATS_URL").filter(|v| !v.is_empty()),
        })
    }
}
