#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use billing_hooks::AppState;
use billing_hooks::api::create_router;
use billing_hooks::auth::create_token;
use billing_hooks::db::MemoryStore;
use billing_hooks::stripe::{
    CheckoutParams, PaymentProvider, StripeApiError, StripeSettings, sign_payload,
};
use shared::billing::User;

pub const AUTH_SECRET: &str = "test-auth-secret";
pub const WEBHOOK_SECRET: &str = "whsec_test";
pub const RETURN_URL: &str = "https://app.test/account";

/// Recording stand-in for the Stripe API
#[derive(Default)]
pub struct FakePayments {
    next_customer: AtomicUsize,
    pub customers_created: Mutex<Vec<String>>,
    pub checkouts: Mutex<Vec<CheckoutParams>>,
    pub portals: Mutex<Vec<(String, String)>>,
    pub fail: AtomicBool,
}

impl FakePayments {
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StripeApiError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StripeApiError::Stripe {
                type_: "api_error".into(),
                message: Some("stripe is down".into()),
                code: None,
                param: None,
                status: 500,
            });
        }
        Ok(())
    }

    pub fn customer_count(&self) -> usize {
        self.customers_created.lock().unwrap().len()
    }

    pub fn last_checkout(&self) -> Option<CheckoutParams> {
        self.checkouts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl PaymentProvider for FakePayments {
    async fn create_customer(&self, user: &User) -> Result<String, StripeApiError> {
        self.check()?;
        let n = self.next_customer.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("cus_test{n}");
        self.customers_created
            .lock()
            .unwrap()
            .push(user.id.clone());
        Ok(id)
    }

    async fn create_checkout_session(
        &self,
        params: &CheckoutParams,
    ) -> Result<Value, StripeApiError> {
        self.check()?;
        self.checkouts.lock().unwrap().push(params.clone());
        Ok(json!({
            "id": "cs_test_1",
            "object": "checkout.session",
            "customer": params.customer_id,
            "mode": params.mode.as_str(),
            "url": "https://checkout.stripe.test/c/pay/cs_test_1"
        }))
    }

    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<Value, StripeApiError> {
        self.check()?;
        self.portals
            .lock()
            .unwrap()
            .push((customer_id.to_string(), return_url.to_string()));
        Ok(json!({
            "id": "bps_test_1",
            "object": "billing_portal.session",
            "customer": customer_id,
            "return_url": return_url,
            "url": "https://billing.stripe.test/session/bps_test_1"
        }))
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub payments: Arc<FakePayments>,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let payments = Arc::new(FakePayments::default());
        let settings = StripeSettings {
            secret_key: "sk_test".into(),
            webhook_secret: WEBHOOK_SECRET.into(),
            success_url: "https://app.test/account".into(),
            cancel_url: "https://app.test/".into(),
            portal_return_url: RETURN_URL.into(),
            ..Default::default()
        };
        let state = AppState::from_parts(
            store.clone(),
            payments.clone(),
            Arc::new(settings),
            AUTH_SECRET.to_string(),
        );
        Self {
            router: create_router(state),
            store,
            payments,
        }
    }

    /// Seed a platform user and return a valid token for it
    pub fn user(&self, id: &str) -> String {
        let mut user = User::new(id);
        user.email = Some(format!("{id}@example.com"));
        self.store.insert_user(user);
        token(id)
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    pub async fn checkout(&self, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        let mut builder = Request::post("/create-checkout-session")
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", token);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    /// Deliver a correctly signed webhook
    pub async fn webhook(&self, event: &Value) -> (StatusCode, Value) {
        let payload = event.to_string();
        let header = sign_payload(payload.as_bytes(), WEBHOOK_SECRET, now());
        self.webhook_raw(payload, Some(header)).await
    }

    pub async fn webhook_raw(&self, payload: String, signature: Option<String>) -> (StatusCode, Value) {
        let mut builder = Request::post("/stripe").header("content-type", "application/json");
        if let Some(sig) = signature {
            builder = builder.header("stripe-signature", sig);
        }
        self.send(builder.body(Body::from(payload)).unwrap()).await
    }
}

pub fn token(user_id: &str) -> String {
    create_token(user_id, AUTH_SECRET, chrono::Duration::hours(1)).unwrap()
}

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

pub fn event(id: &str, event_type: &str, object: Value) -> Value {
    json!({
        "id": id,
        "object": "event",
        "type": event_type,
        "created": now(),
        "data": { "object": object }
    })
}

pub fn subscription_object(id: &str, customer: &str, status: &str) -> Value {
    json!({
        "id": id,
        "object": "subscription",
        "customer": customer,
        "status": status,
        "metadata": {},
        "cancel_at_period_end": false,
        "created": 1_700_000_000,
        "current_period_start": 1_700_000_000,
        "current_period_end": 1_702_592_000,
        "items": {"object": "list", "data": [
            {"id": "si_1", "price": {"id": "price_pro"}, "quantity": 1}
        ]},
        "default_payment_method": {
            "id": "pm_1",
            "type": "card",
            "customer": {"id": customer, "address": {"city": "Austin", "country": "US", "postal_code": "78701"}}
        }
    })
}
