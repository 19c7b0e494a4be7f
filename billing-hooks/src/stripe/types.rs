//! Stripe webhook payloads
//!
//! Only the fields the reconciler reads are modelled; serde ignores the rest.
//! Deliveries are decoded in two steps: [`RawEvent`] for the envelope, then
//! [`WebhookEvent::try_from`] for the closed set of handled event kinds.

use std::str::FromStr;

use serde::Deserialize;
use serde_json::{Map, Value};
use shared::billing::{BillingAddress, PriceInterval, PriceType};
use shared::error::AppError;

/// An id, or the object itself when the API expanded it
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Expandable<T> {
    Id(String),
    Object(Box<T>),
}

/// Objects with a processor id
pub trait Object {
    fn id(&self) -> &str;
}

impl<T: Object> Expandable<T> {
    pub fn id(&self) -> &str {
        match self {
            Self::Id(id) => id,
            Self::Object(obj) => obj.id(),
        }
    }

    pub fn as_object(&self) -> Option<&T> {
        match self {
            Self::Id(_) => None,
            Self::Object(obj) => Some(obj),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct List<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

impl<T> Default for List<T> {
    fn default() -> Self {
        Self { data: Vec::new() }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Product {
    pub id: String,
    #[serde(default)]
    pub active: bool,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Recurring {
    pub interval: PriceInterval,
    pub interval_count: Option<i64>,
    pub trial_period_days: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Price {
    pub id: String,
    pub product: Expandable<Product>,
    #[serde(default)]
    pub active: bool,
    pub currency: String,
    pub nickname: Option<String>,
    #[serde(rename = "type")]
    pub price_type: PriceType,
    pub unit_amount: Option<i64>,
    pub recurring: Option<Recurring>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Customer {
    pub id: String,
    pub address: Option<BillingAddress>,
    pub email: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PaymentMethod {
    pub id: String,
    #[serde(rename = "type")]
    pub method_type: String,
    pub customer: Option<Expandable<Customer>>,
}

/// Subscription item; only the price id is needed
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SubscriptionItem {
    pub id: String,
    pub price: ItemPrice,
    pub quantity: Option<i64>,
    pub created: Option<i64>,
    pub current_period_start: Option<i64>,
    pub current_period_end: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ItemPrice {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub customer: Expandable<Customer>,
    pub status: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub items: List<SubscriptionItem>,
    #[serde(default)]
    pub cancel_at_period_end: bool,
    pub cancel_at: Option<i64>,
    pub canceled_at: Option<i64>,
    pub current_period_start: Option<i64>,
    pub current_period_end: Option<i64>,
    pub created: Option<i64>,
    pub ended_at: Option<i64>,
    pub trial_start: Option<i64>,
    pub trial_end: Option<i64>,
    pub default_payment_method: Option<Expandable<PaymentMethod>>,
}

impl Subscription {
    pub fn first_item(&self) -> Option<&SubscriptionItem> {
        self.items.data.first()
    }

    /// Period bounds, falling back to the first item for newer API versions
    pub fn period(&self) -> (Option<i64>, Option<i64>) {
        let item = self.first_item();
        (
            self.current_period_start
                .or_else(|| item.and_then(|i| i.current_period_start)),
            self.current_period_end
                .or_else(|| item.and_then(|i| i.current_period_end)),
        )
    }

    /// Billing address and type of the default payment method, when expanded
    pub fn payment_details(&self) -> (Option<BillingAddress>, Option<String>) {
        let Some(pm) = self
            .default_payment_method
            .as_ref()
            .and_then(Expandable::as_object)
        else {
            return (None, None);
        };
        let address = pm
            .customer
            .as_ref()
            .and_then(Expandable::as_object)
            .and_then(|c| c.address.clone());
        (address, Some(pm.method_type.clone()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    Payment,
    Setup,
    Subscription,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CustomerDetails {
    pub address: Option<BillingAddress>,
    pub email: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub mode: SessionMode,
    pub customer: Option<Expandable<Customer>>,
    pub subscription: Option<Expandable<Subscription>>,
    pub customer_details: Option<CustomerDetails>,
    pub payment_method_types: Option<Vec<String>>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl CheckoutSession {
    /// Processor customer id: the session's own, else the expanded subscription's
    pub fn customer_id(&self) -> Option<&str> {
        self.customer.as_ref().map(Expandable::id).or_else(|| {
            self.subscription
                .as_ref()
                .and_then(Expandable::as_object)
                .map(|s| s.customer.id())
        })
    }
}

macro_rules! impl_object {
    ($($ty:ty),*) => {
        $(impl Object for $ty {
            fn id(&self) -> &str {
                &self.id
            }
        })*
    };
}

impl_object!(Product, Customer, PaymentMethod, Subscription);

// ==================== Events ====================

/// Event envelope as delivered
#[derive(Debug, Clone, Deserialize)]
pub struct RawEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: RawEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawEventData {
    pub object: Value,
}

/// Handled event kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    ProductCreated,
    ProductUpdated,
    PriceCreated,
    PriceUpdated,
    SubscriptionCreated,
    SubscriptionUpdated,
    SubscriptionDeleted,
    CheckoutSessionCompleted,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProductCreated => "product.created",
            Self::ProductUpdated => "product.updated",
            Self::PriceCreated => "price.created",
            Self::PriceUpdated => "price.updated",
            Self::SubscriptionCreated => "customer.subscription.created",
            Self::SubscriptionUpdated => "customer.subscription.updated",
            Self::SubscriptionDeleted => "customer.subscription.deleted",
            Self::CheckoutSessionCompleted => "checkout.session.completed",
        }
    }
}

impl FromStr for EventKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "product.created" => Self::ProductCreated,
            "product.updated" => Self::ProductUpdated,
            "price.created" => Self::PriceCreated,
            "price.updated" => Self::PriceUpdated,
            "customer.subscription.created" => Self::SubscriptionCreated,
            "customer.subscription.updated" => Self::SubscriptionUpdated,
            "customer.subscription.deleted" => Self::SubscriptionDeleted,
            "checkout.session.completed" => Self::CheckoutSessionCompleted,
            other => return Err(AppError::unsupported_event(other)),
        })
    }
}

/// A decoded, handled webhook event
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookEvent {
    ProductCreated(Product),
    ProductUpdated(Product),
    PriceCreated(Price),
    PriceUpdated(Price),
    SubscriptionCreated(Subscription),
    SubscriptionUpdated(Subscription),
    SubscriptionDeleted(Subscription),
    CheckoutSessionCompleted(CheckoutSession),
}

impl WebhookEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::ProductCreated(_) => EventKind::ProductCreated,
            Self::ProductUpdated(_) => EventKind::ProductUpdated,
            Self::PriceCreated(_) => EventKind::PriceCreated,
            Self::PriceUpdated(_) => EventKind::PriceUpdated,
            Self::SubscriptionCreated(_) => EventKind::SubscriptionCreated,
            Self::SubscriptionUpdated(_) => EventKind::SubscriptionUpdated,
            Self::SubscriptionDeleted(_) => EventKind::SubscriptionDeleted,
            Self::CheckoutSessionCompleted(_) => EventKind::CheckoutSessionCompleted,
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(kind: EventKind, object: Value) -> Result<T, AppError> {
    serde_json::from_value(object).map_err(|e| {
        AppError::malformed_event(format!("invalid {} payload: {e}", kind.as_str()))
            .with_detail("event_type", kind.as_str())
    })
}

impl TryFrom<RawEvent> for WebhookEvent {
    type Error = AppError;

    fn try_from(raw: RawEvent) -> Result<Self, Self::Error> {
        let kind: EventKind = raw.event_type.parse()?;
        let object = raw.data.object;
        Ok(match kind {
            EventKind::ProductCreated => Self::ProductCreated(decode(kind, object)?),
            EventKind::ProductUpdated => Self::ProductUpdated(decode(kind, object)?),
            EventKind::PriceCreated => Self::PriceCreated(decode(kind, object)?),
            EventKind::PriceUpdated => Self::PriceUpdated(decode(kind, object)?),
            EventKind::SubscriptionCreated => Self::SubscriptionCreated(decode(kind, object)?),
            EventKind::SubscriptionUpdated => Self::SubscriptionUpdated(decode(kind, object)?),
            EventKind::SubscriptionDeleted => Self::SubscriptionDeleted(decode(kind, object)?),
            EventKind::CheckoutSessionCompleted => {
                Self::CheckoutSessionCompleted(decode(kind, object)?)
            }
        })
    }
}
