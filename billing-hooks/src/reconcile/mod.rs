//! Event reconciliation
//!
//! Applies one verified webhook event to the local mirror records. Every
//! write is a full-record upsert keyed by the processor id, so redelivering
//! an event converges on the same stored state.

use std::sync::Arc;

use serde_json::Value;
use shared::billing::{
    BillingAddress, CustomerMapping, PriceRecord, ProductRecord, SubscriptionRecord,
};
use shared::error::{AppError, ErrorCode};
use shared::util::epoch_to_utc;
use uuid::Uuid;

use crate::db::Store;
use crate::error::ServiceResult;
use crate::stripe::types::{
    CheckoutSession, Price, Product, SessionMode, Subscription, WebhookEvent,
};

/// Mirror record kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Product,
    Price,
    Subscription,
    CheckoutSession,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Created,
    Updated,
    /// Event acknowledged without writes
    Skipped,
}

/// Result of applying one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    pub kind: EntityKind,
    pub external_id: String,
    pub outcome: Outcome,
}

impl Reconciled {
    fn new(kind: EntityKind, external_id: &str, existed: bool) -> Self {
        Self {
            kind,
            external_id: external_id.to_string(),
            outcome: if existed {
                Outcome::Updated
            } else {
                Outcome::Created
            },
        }
    }
}

pub struct Reconciler {
    store: Arc<dyn Store>,
}

impl Reconciler {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn reconcile(&self, event: &WebhookEvent) -> ServiceResult<Reconciled> {
        match event {
            WebhookEvent::ProductCreated(p) | WebhookEvent::ProductUpdated(p) => {
                self.upsert_product(p).await
            }
            WebhookEvent::PriceCreated(p) | WebhookEvent::PriceUpdated(p) => {
                self.upsert_price(p).await
            }
            WebhookEvent::SubscriptionCreated(s) => self.upsert_subscription(s, true).await,
            WebhookEvent::SubscriptionUpdated(s) | WebhookEvent::SubscriptionDeleted(s) => {
                self.upsert_subscription(s, false).await
            }
            WebhookEvent::CheckoutSessionCompleted(session) => {
                self.complete_checkout(session).await
            }
        }
    }

    async fn upsert_product(&self, product: &Product) -> ServiceResult<Reconciled> {
        let existing = self.store.find_product(&product.id).await?;
        let record = ProductRecord {
            id: existing.as_ref().map(|r| r.id).unwrap_or_else(Uuid::new_v4),
            product_id: product.id.clone(),
            active: product.active,
            name: product.name.clone(),
            description: product.description.clone().unwrap_or_default(),
            metadata: Value::Object(product.metadata.clone()),
        };
        self.store.save_product(&record).await?;

        tracing::info!(product_id = %product.id, "Product mirrored");
        Ok(Reconciled::new(
            EntityKind::Product,
            &product.id,
            existing.is_some(),
        ))
    }

    async fn upsert_price(&self, price: &Price) -> ServiceResult<Reconciled> {
        let existing = self.store.find_price(&price.id).await?;
        let recurring = price.recurring.as_ref();
        let record = PriceRecord {
            id: existing.as_ref().map(|r| r.id).unwrap_or_else(Uuid::new_v4),
            price_id: price.id.clone(),
            product_id: price.product.id().to_string(),
            active: price.active,
            currency: price.currency.clone(),
            description: price.nickname.clone().unwrap_or_default(),
            price_type: price.price_type.as_db().to_string(),
            unit_amount: price.unit_amount,
            interval: recurring.map(|r| r.interval.as_db().to_string()),
            interval_count: recurring.and_then(|r| r.interval_count),
            trial_period_days: recurring.and_then(|r| r.trial_period_days),
            metadata: Value::Object(price.metadata.clone()),
        };
        self.store.save_price(&record).await?;

        tracing::info!(price_id = %price.id, price_type = %record.price_type, "Price mirrored");
        Ok(Reconciled::new(EntityKind::Price, &price.id, existing.is_some()))
    }

    async fn upsert_subscription(
        &self,
        subscription: &Subscription,
        created: bool,
    ) -> ServiceResult<Reconciled> {
        let mapping = self.require_mapping(subscription.customer.id()).await?;
        let existing = self.store.find_subscription(&subscription.id).await?;
        let record = subscription_record(
            existing.as_ref().map(|r| r.id),
            subscription,
            &mapping.user_id,
        )?;
        self.store.save_subscription(&record).await?;

        tracing::info!(
            subscription_id = %subscription.id,
            user_id = %mapping.user_id,
            status = %record.status,
            "Subscription mirrored"
        );

        if created {
            let (address, method) = subscription.payment_details();
            self.write_user_billing(&mapping.user_id, address, method)
                .await;
        }

        Ok(Reconciled::new(
            EntityKind::Subscription,
            &subscription.id,
            existing.is_some(),
        ))
    }

    async fn complete_checkout(&self, session: &CheckoutSession) -> ServiceResult<Reconciled> {
        if session.mode != SessionMode::Subscription {
            tracing::debug!(session_id = %session.id, mode = ?session.mode, "Checkout completed outside subscription mode");
            return Ok(Reconciled {
                kind: EntityKind::CheckoutSession,
                external_id: session.id.clone(),
                outcome: Outcome::Skipped,
            });
        }

        let customer_id = session.customer_id().ok_or_else(|| {
            AppError::malformed_event("checkout session has no customer")
                .with_detail("session_id", session.id.as_str())
        })?;
        let subscription = session.subscription.as_ref().ok_or_else(|| {
            AppError::malformed_event("checkout session has no subscription")
                .with_detail("session_id", session.id.as_str())
        })?;
        let mapping = self.require_mapping(customer_id).await?;

        let subscription_id = subscription.id();
        let existing = self.store.find_subscription(subscription_id).await?;
        let record = match subscription.as_object() {
            Some(full) => {
                subscription_record(existing.as_ref().map(|r| r.id), full, &mapping.user_id)?
            }
            // Session metadata only seeds a row the subscription events have not written yet
            None => match existing.clone() {
                Some(mut record) => {
                    record.user_id = mapping.user_id.clone();
                    record
                }
                None => {
                    let mut record = SubscriptionRecord::placeholder(
                        subscription_id,
                        mapping.user_id.as_str(),
                    );
                    record.metadata = Value::Object(session.metadata.clone());
                    record
                }
            },
        };
        self.store.save_subscription(&record).await?;

        tracing::info!(
            session_id = %session.id,
            subscription_id = %subscription_id,
            user_id = %mapping.user_id,
            "Checkout session completed"
        );

        let (sub_address, sub_method) = subscription
            .as_object()
            .map(Subscription::payment_details)
            .unwrap_or_default();
        let address = session
            .customer_details
            .as_ref()
            .and_then(|d| d.address.clone())
            .or(sub_address);
        let method = sub_method.or_else(|| {
            session
                .payment_method_types
                .as_ref()
                .and_then(|types| types.first().cloned())
        });
        self.write_user_billing(&mapping.user_id, address, method)
            .await;

        Ok(Reconciled::new(
            EntityKind::Subscription,
            subscription_id,
            existing.is_some(),
        ))
    }

    /// Resolve the customer mapping; its absence is a hard failure
    async fn require_mapping(&self, stripe_customer_id: &str) -> ServiceResult<CustomerMapping> {
        match self
            .store
            .find_customer_by_stripe_id(stripe_customer_id)
            .await?
        {
            Some(mapping) => Ok(mapping),
            None => {
                tracing::warn!(stripe_customer_id = %stripe_customer_id, "No customer mapping");
                Err(AppError::new(ErrorCode::CustomerNotFound)
                    .with_detail("stripe_customer_id", stripe_customer_id)
                    .into())
            }
        }
    }

    /// Best-effort write of the user's billing details. Unknown fields keep
    /// their stored value.
    async fn write_user_billing(
        &self,
        user_id: &str,
        address: Option<BillingAddress>,
        payment_method: Option<String>,
    ) {
        if address.is_none() && payment_method.is_none() {
            return;
        }
        if let Err(e) = self
            .store
            .update_user_billing(user_id, address.as_ref(), payment_method.as_deref())
            .await
        {
            tracing::warn!(user_id = %user_id, error = %e, "Failed to update user billing details");
        }
    }
}

/// Build the full mirror record for a subscription
fn subscription_record(
    id: Option<Uuid>,
    sub: &Subscription,
    user_id: &str,
) -> Result<SubscriptionRecord, AppError> {
    let item = sub.first_item().ok_or_else(|| {
        AppError::malformed_event("subscription has no items")
            .with_detail("subscription_id", sub.id.as_str())
    })?;
    let (period_start, period_end) = sub.period();

    Ok(SubscriptionRecord {
        id: id.unwrap_or_else(Uuid::new_v4),
        subscription_id: sub.id.clone(),
        user_id: user_id.to_string(),
        metadata: Value::Object(sub.metadata.clone()),
        status: sub.status.clone(),
        price_id: Some(item.price.id.clone()),
        quantity: item.quantity,
        cancel_at_period_end: sub.cancel_at_period_end,
        cancel_at: epoch_to_utc(sub.cancel_at),
        canceled_at: epoch_to_utc(sub.canceled_at),
        current_period_start: epoch_to_utc(period_start),
        current_period_end: epoch_to_utc(period_end),
        created: epoch_to_utc(sub.created.or(item.created)),
        ended_at: epoch_to_utc(sub.ended_at),
        trial_start: epoch_to_utc(sub.trial_start),
        trial_end: epoch_to_utc(sub.trial_end),
    })
}
