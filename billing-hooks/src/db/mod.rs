//! Record storage
//!
//! [`Store`] is the lookup/upsert port the handlers and reconciler use.
//! [`PgStore`] is the production adapter; [`MemoryStore`] backs tests and
//! `DATABASE_URL=memory://`.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use shared::billing::{
    BillingAddress, CustomerMapping, PriceRecord, ProductRecord, SubscriptionRecord, User,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Record lookups and atomic full-record upserts.
///
/// Lookups return `Ok(None)` only when the record does not exist.
#[async_trait]
pub trait Store: Send + Sync {
    async fn find_user(&self, id: &str) -> StoreResult<Option<User>>;

    /// Set the billing address and payment method of a user; `None` keeps the
    /// stored value
    async fn update_user_billing(
        &self,
        user_id: &str,
        address: Option<&BillingAddress>,
        payment_method: Option<&str>,
    ) -> StoreResult<()>;

    async fn find_customer_by_user(&self, user_id: &str) -> StoreResult<Option<CustomerMapping>>;

    async fn find_customer_by_stripe_id(
        &self,
        stripe_customer_id: &str,
    ) -> StoreResult<Option<CustomerMapping>>;

    /// Insert unless the user already has a mapping; returns the stored mapping
    async fn insert_customer(&self, mapping: CustomerMapping) -> StoreResult<CustomerMapping>;

    async fn find_product(&self, product_id: &str) -> StoreResult<Option<ProductRecord>>;
    async fn save_product(&self, record: &ProductRecord) -> StoreResult<()>;

    async fn find_price(&self, price_id: &str) -> StoreResult<Option<PriceRecord>>;
    async fn save_price(&self, record: &PriceRecord) -> StoreResult<()>;

    async fn find_subscription(
        &self,
        subscription_id: &str,
    ) -> StoreResult<Option<SubscriptionRecord>>;
    async fn save_subscription(&self, record: &SubscriptionRecord) -> StoreResult<()>;

    async fn is_event_processed(&self, event_id: &str) -> StoreResult<bool>;
    async fn mark_event_processed(&self, event_id: &str, event_type: &str) -> StoreResult<()>;
}
