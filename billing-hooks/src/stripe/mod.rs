//! Stripe integration via REST API (no SDK dependency)

mod errors;
mod signature;
pub mod types;

pub use errors::{SignatureError, StripeApiError, StripeErrorEnvelope};
pub use signature::{sign_payload, verify_webhook_signature};

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use shared::billing::{PriceType, User};

/// Stripe credentials, limits and redirect URLs.
///
/// Built once by [`crate::config::Config`] and handed to [`StripeClient`]
/// and the webhook handler.
#[derive(Clone)]
pub struct StripeSettings {
    pub secret_key: String,
    pub webhook_secret: String,
    /// Maximum age of a signed webhook delivery, in seconds
    pub webhook_tolerance_secs: i64,
    pub api_base: String,
    pub timeout_ms: u64,
    pub success_url: String,
    pub cancel_url: String,
    pub portal_return_url: String,
}

impl Default for StripeSettings {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            webhook_secret: String::new(),
            webhook_tolerance_secs: 300,
            api_base: "https://api.stripe.com".to_string(),
            timeout_ms: 15_000,
            success_url: String::new(),
            cancel_url: String::new(),
            portal_return_url: String::new(),
        }
    }
}

impl std::fmt::Debug for StripeSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeSettings")
            .field("secret_key", &"<redacted>")
            .field("webhook_secret", &"<redacted>")
            .field("webhook_tolerance_secs", &self.webhook_tolerance_secs)
            .field("api_base", &self.api_base)
            .field("timeout_ms", &self.timeout_ms)
            .field("success_url", &self.success_url)
            .field("cancel_url", &self.cancel_url)
            .field("portal_return_url", &self.portal_return_url)
            .finish()
    }
}

/// Checkout session mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutMode {
    Payment,
    Subscription,
}

impl CheckoutMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Payment => "payment",
            Self::Subscription => "subscription",
        }
    }
}

impl From<PriceType> for CheckoutMode {
    fn from(t: PriceType) -> Self {
        match t {
            PriceType::Recurring => Self::Subscription,
            PriceType::OneTime => Self::Payment,
        }
    }
}

/// Parameters for a hosted checkout session
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutParams {
    pub customer_id: String,
    pub price_id: String,
    pub quantity: u32,
    pub mode: CheckoutMode,
    pub success_url: String,
    pub cancel_url: String,
}

impl CheckoutParams {
    /// Form body for `POST /v1/checkout/sessions`
    pub fn to_form(&self) -> Vec<(&'static str, String)> {
        vec![
            ("customer", self.customer_id.clone()),
            ("payment_method_types[0]", "card".to_string()),
            ("billing_address_collection", "required".to_string()),
            ("customer_update[address]", "auto".to_string()),
            ("mode", self.mode.as_str().to_string()),
            ("allow_promotion_codes", "true".to_string()),
            ("line_items[0][price]", self.price_id.clone()),
            ("line_items[0][quantity]", self.quantity.to_string()),
            ("success_url", self.success_url.clone()),
            ("cancel_url", self.cancel_url.clone()),
        ]
    }
}

/// The payment processor calls this service makes
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a processor customer for a local user, returning its id
    async fn create_customer(&self, user: &User) -> Result<String, StripeApiError>;

    /// Create a checkout session; the processor object is returned verbatim
    async fn create_checkout_session(&self, params: &CheckoutParams)
    -> Result<Value, StripeApiError>;

    /// Create a billing portal session; the processor object is returned verbatim
    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<Value, StripeApiError>;
}

/// [`PaymentProvider`] backed by the Stripe REST API
#[derive(Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    settings: std::sync::Arc<StripeSettings>,
}

impl StripeClient {
    pub fn new(settings: std::sync::Arc<StripeSettings>) -> Result<Self, StripeApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()?;
        Ok(Self { http, settings })
    }

    async fn post_form(
        &self,
        path: &str,
        form: &[(&str, String)],
    ) -> Result<Value, StripeApiError> {
        let url = format!("{}{}", self.settings.api_base.trim_end_matches('/'), path);
        let resp = self
            .http
            .post(&url)
            .basic_auth(&self.settings.secret_key, None::<&str>)
            .form(form)
            .send()
            .await?;

        let status = resp.status();
        let body: Value = resp.json().await?;
        if !status.is_success() {
            return Err(match serde_json::from_value::<StripeErrorEnvelope>(body.clone()) {
                Ok(envelope) => envelope.into_api_error(status.as_u16()),
                Err(_) => StripeApiError::Decode(format!("status {status}: {body}")),
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl PaymentProvider for StripeClient {
    async fn create_customer(&self, user: &User) -> Result<String, StripeApiError> {
        let mut form = vec![("metadata[user_id]", user.id.clone())];
        if let Some(email) = &user.email {
            form.push(("email", email.clone()));
        }
        if let Some(name) = &user.name {
            form.push(("name", name.clone()));
        }

        let resp = self.post_form("/v1/customers", &form).await?;
        resp["id"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| StripeApiError::Decode(format!("customer without id: {resp}")))
    }

    async fn create_checkout_session(
        &self,
        params: &CheckoutParams,
    ) -> Result<Value, StripeApiError> {
        self.post_form("/v1/checkout/sessions", &params.to_form())
            .await
    }

    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<Value, StripeApiError> {
        let form = [
            ("customer", customer_id.to_string()),
            ("return_url", return_url.to_string()),
        ];
        self.post_form("/v1/billing_portal/sessions", &form).await
    }
}
