use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use std::sync::Arc;
use storefront::auth::{AuthUser, JwtKeys, AUTH_COOKIE};
use storefront::domain::aggregates::Product;
use storefront::http::{router, AppState, Dependencies};
use storefront::payment::{CheckoutSession, CheckoutSessionRequest, PaymentGateway, WebhookVerifier};
use storefront::services::{CheckoutSettings, EventPublisher};
use storefront::store::MemoryStore;
use tokio::sync::Mutex;
use tower::ServiceExt;

const WEBHOOK_SECRET: &str = "whsec_integration";
const JWT_SECRET: &[u8] = b"integration-jwt";

#[derive(Default)]
struct FakeGateway { requests: Mutex<Vec<CheckoutSessionRequest>> }

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_checkout_session(&self, request: &CheckoutSessionRequest) -> storefront::Result<CheckoutSession> {
        let mut requests = self.requests.lock().await;
        requests.push(request.clone());
        Ok(CheckoutSession { id: format!("cs_{}", requests.len()), url: format!("https://checkout.test/cs_{}", requests.len()) })
    }
}

struct Harness { app: Router, store: MemoryStore, gateway: Arc<FakeGateway>, verifier: WebhookVerifier }

fn harness(stock: i64) -> Harness {
    let store = MemoryStore::with_products([Product::new(7, "Mug", dec!(19.99), stock)]);
    let gateway = Arc::new(FakeGateway::default());
    let verifier = WebhookVerifier::new(WEBHOOK_SECRET, 300);
    let state = AppState::new(Dependencies {
        catalog: Arc::new(store.clone()),
        orders: Arc::new(store.clone()),
        gateway: gateway.clone(),
        verifier: verifier.clone(),
        events: EventPublisher::disabled(),
        settings: CheckoutSettings::new("http://shop.test", "usd", dec!(5)),
        jwt: JwtKeys::new(JWT_SECRET),
    });
    Harness { app: router(state), store, gateway, verifier }
}

fn auth_cookie(user_id: i64) -> String {
    let user = AuthUser { user_id, name: "Taro".into(), email: "taro@example.com".into(), is_admin: false };
    let token = JwtKeys::new(JWT_SECRET).issue(&user, chrono::Duration::hours(1)).unwrap();
    format!("{AUTH_COOKIE}={token}")
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn checkout_request(cookie: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri("/api/orders/checkout").header("content-type", "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header("cookie", cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn webhook_request(body: &[u8], signature: &str) -> Request<Body> {
    Request::builder().method("POST").uri("/api/orders/webhook")
        .header("stripe-signature", signature)
        .body(Body::from(body.to_vec())).unwrap()
}

fn completed_event(order_id: &str, user_id: &str) -> Vec<u8> {
    json!({
        "id": "evt_1",
        "type": "checkout.session.completed",
        "data": { "object": { "id": "cs_1", "metadata": { "orderId": order_id, "userId": user_id } } }
    }).to_string().into_bytes()
}

#[tokio::test]
async fn checkout_then_duplicate_webhook_books_stock_once() {
    let h = harness(5);
    let cookie = auth_cookie(42);

    let (status, body) = send(&h.app, checkout_request(Some(cookie.as_str()), json!({
        "items": [{ "id": 7, "quantity": 2, "price": 0.01 }],
        "address": "1-2-3 Chiyoda, Tokyo"
    }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["url"], "https://checkout.test/cs_1");

    let order_id = h.gateway.requests.lock().await[0].order_id;
    let order = h.store.order(order_id).await.unwrap();
    assert_eq!(order.total(), dec!(44.98));
    assert_eq!(order.payment_session_id(), Some("cs_1"));

    let event = completed_event(&order_id.to_string(), "42");
    let signature = h.verifier.sign(&event, chrono::Utc::now().timestamp()).unwrap();
    for _ in 0..2 {
        let (status, body) = send(&h.app, webhook_request(&event, &signature)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "received": true }));
    }

    let mug = h.store.product(7).await.unwrap();
    assert_eq!((mug.stock, mug.sales_count), (3, 2));

    let (status, body) = send(&h.app, Request::builder().uri("/api/orders").header("cookie", &cookie).body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    let orders = body["orders"].as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["status"], "completed");
    assert_eq!(orders[0]["paymentStatus"], "payment_success");
    assert_eq!(orders[0]["items"][0]["productName"], "Mug");
    assert_eq!(orders[0]["items"][0]["quantity"], 2);
}

#[tokio::test]
async fn checkout_requires_authentication() {
    let h = harness(5);
    let (status, body) = send(&h.app, checkout_request(None, json!({ "items": [{ "id": 7, "quantity": 1 }], "address": "x" }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Not authenticated.");

    let (status, _) = send(&h.app, checkout_request(Some("authToken=forged"), json!({ "items": [{ "id": 7, "quantity": 1 }], "address": "x" }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(h.store.order_count().await, 0);
}

#[tokio::test]
async fn out_of_stock_names_the_product() {
    let h = harness(1);
    let (status, body) = send(&h.app, checkout_request(Some(auth_cookie(42).as_str()), json!({
        "items": [{ "id": 7, "quantity": 2 }],
        "address": "x"
    }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Items out of stock: Mug");
    assert!(h.gateway.requests.lock().await.is_empty());
}

#[tokio::test]
async fn malformed_checkout_bodies_are_rejected() {
    let h = harness(5);
    let cookie = auth_cookie(42);
    let (status, body) = send(&h.app, checkout_request(Some(cookie.as_str()), json!({ "items": [], "address": "x" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No products selected.");

    let (status, body) = send(&h.app, checkout_request(Some(cookie.as_str()), json!({ "items": "nope" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn forged_webhook_is_rejected_without_side_effects() {
    let h = harness(5);
    let (status, _) = send(&h.app, checkout_request(Some(auth_cookie(42).as_str()), json!({ "items": [{ "id": 7, "quantity": 2 }], "address": "x" }))).await;
    assert_eq!(status, StatusCode::OK);
    let order_id = h.gateway.requests.lock().await[0].order_id;

    let event = completed_event(&order_id.to_string(), "42");
    let forged = WebhookVerifier::new("whsec_attacker", 300).sign(&event, chrono::Utc::now().timestamp()).unwrap();
    let (status, body) = send(&h.app, webhook_request(&event, &forged)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Webhook signature verification failed.");

    assert_eq!(h.store.product(7).await.unwrap().stock, 5);
    assert_eq!(h.store.order(order_id).await.unwrap().payment_status().as_str(), "unpaid");
}

#[tokio::test]
async fn malformed_but_signed_webhooks_are_acknowledged() {
    let h = harness(5);
    let event = completed_event("not-a-uuid", "42");
    let signature = h.verifier.sign(&event, chrono::Utc::now().timestamp()).unwrap();
    let (status, body) = send(&h.app, webhook_request(&event, &signature)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "received": true }));
}
