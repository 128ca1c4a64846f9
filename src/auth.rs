//! Session authentication: HS256 JWT from the `authToken` cookie or a bearer header.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::{header, request::Parts};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use crate::http::ApiError;
use crate::{EcommerceError, Result, UserId};

pub const AUTH_COOKIE: &str = "authToken";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub user_id: UserId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Serialize, Deserialize)]
struct Claims {
    #[serde(flatten)]
    user: AuthUser,
    iat: i64,
    exp: i64,
}

#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtKeys {
    pub fn new(secret: &[u8]) -> Self {
        Self { encoding: EncodingKey::from_secret(secret), decoding: DecodingKey::from_secret(secret) }
    }

    pub fn issue(&self, user: &AuthUser, ttl: Duration) -> Result<String> {
        let now = Utc::now();
        let claims = Claims { user: user.clone(), iat: now.timestamp(), exp: (now + ttl).timestamp() };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|e| EcommerceError::Config(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<AuthUser> {
        decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims.user)
            .map_err(|e| {
                debug!(error = %e, "Token rejected");
                EcommerceError::NotAuthenticated
            })
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?.strip_prefix("Bearer ").map(str::trim)
}

fn cookie<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get_all(header::COOKIE).iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v)
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    JwtKeys: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> std::result::Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let token = bearer_token(parts).or_else(|| cookie(parts, AUTH_COOKIE)).ok_or(EcommerceError::NotAuthenticated)?;
        Ok(keys.verify(token)?)
    }
}
