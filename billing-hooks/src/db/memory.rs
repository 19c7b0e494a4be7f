use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use shared::billing::{
    BillingAddress, CustomerMapping, PriceRecord, ProductRecord, SubscriptionRecord, User,
};

use super::{Store, StoreError, StoreResult};

/// In-process [`Store`] keyed the same way as the SQL unique constraints
#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<String, User>,
    /// user_id -> mapping
    customers: DashMap<String, CustomerMapping>,
    products: DashMap<String, ProductRecord>,
    prices: DashMap<String, PriceRecord>,
    subscriptions: DashMap<String, SubscriptionRecord>,
    /// event_id -> event_type
    events: DashMap<String, String>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Users are owned by the backend platform; seed them directly
    pub fn insert_user(&self, user: User) {
        self.users.insert(user.id.clone(), user);
    }

    /// Make every subsequent call fail with [`StoreError::Unavailable`]
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn customer_count(&self) -> usize {
        self.customers.len()
    }

    pub fn product_count(&self) -> usize {
        self.products.len()
    }

    pub fn price_count(&self) -> usize {
        self.prices.len()
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn processed_event_count(&self) -> usize {
        self.events.len()
    }

    fn check(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_user(&self, id: &str) -> StoreResult<Option<User>> {
        self.check()?;
        Ok(self.users.get(id).map(|u| u.value().clone()))
    }

    async fn update_user_billing(
        &self,
        user_id: &str,
        address: Option<&BillingAddress>,
        payment_method: Option<&str>,
    ) -> StoreResult<()> {
        self.check()?;
        let address = address.map(serde_json::to_value).transpose()?;
        if let Some(mut user) = self.users.get_mut(user_id) {
            if let Some(address) = address {
                user.billing_address = Some(address);
            }
            if let Some(method) = payment_method {
                user.payment_method = Some(method.to_string());
            }
        }
        Ok(())
    }

    async fn find_customer_by_user(&self, user_id: &str) -> StoreResult<Option<CustomerMapping>> {
        self.check()?;
        Ok(self.customers.get(user_id).map(|c| c.value().clone()))
    }

    async fn find_customer_by_stripe_id(
        &self,
        stripe_customer_id: &str,
    ) -> StoreResult<Option<CustomerMapping>> {
        self.check()?;
        Ok(self
            .customers
            .iter()
            .find(|c| c.stripe_customer_id == stripe_customer_id)
            .map(|c| c.value().clone()))
    }

    async fn insert_customer(&self, mapping: CustomerMapping) -> StoreResult<CustomerMapping> {
        self.check()?;
        match self.customers.entry(mapping.user_id.clone()) {
            Entry::Occupied(existing) => Ok(existing.get().clone()),
            Entry::Vacant(slot) => Ok(slot.insert(mapping).value().clone()),
        }
    }

    async fn find_product(&self, product_id: &str) -> StoreResult<Option<ProductRecord>> {
        self.check()?;
        Ok(self.products.get(product_id).map(|r| r.value().clone()))
    }

    async fn save_product(&self, record: &ProductRecord) -> StoreResult<()> {
        self.check()?;
        upsert(&self.products, &record.product_id, record, |existing, new| {
            new.id = existing.id
        });
        Ok(())
    }

    async fn find_price(&self, price_id: &str) -> StoreResult<Option<PriceRecord>> {
        self.check()?;
        Ok(self.prices.get(price_id).map(|r| r.value().clone()))
    }

    async fn save_price(&self, record: &PriceRecord) -> StoreResult<()> {
        self.check()?;
        upsert(&self.prices, &record.price_id, record, |existing, new| {
            new.id = existing.id
        });
        Ok(())
    }

    async fn find_subscription(
        &self,
        subscription_id: &str,
    ) -> StoreResult<Option<SubscriptionRecord>> {
        self.check()?;
        Ok(self.subscriptions.get(subscription_id).map(|r| r.value().clone()))
    }

    async fn save_subscription(&self, record: &SubscriptionRecord) -> StoreResult<()> {
        self.check()?;
        upsert(
            &self.subscriptions,
            &record.subscription_id,
            record,
            |existing, new| new.id = existing.id,
        );
        Ok(())
    }

    async fn is_event_processed(&self, event_id: &str) -> StoreResult<bool> {
        self.check()?;
        Ok(self.events.contains_key(event_id))
    }

    async fn mark_event_processed(&self, event_id: &str, event_type: &str) -> StoreResult<()> {
        self.check()?;
        self.events
            .entry(event_id.to_string())
            .or_insert_with(|| event_type.to_string());
        Ok(())
    }
}

/// Full-record overwrite; the row's local id survives like the SQL upsert
fn upsert<T: Clone>(
    map: &DashMap<String, T>,
    key: &str,
    record: &T,
    keep_id: impl FnOnce(&T, &mut T),
) {
    let mut new = record.clone();
    match map.entry(key.to_string()) {
        Entry::Occupied(mut slot) => {
            keep_id(slot.get(), &mut new);
            slot.insert(new);
        }
        Entry::Vacant(slot) => {
            slot.insert(new);
        }
    }
}
