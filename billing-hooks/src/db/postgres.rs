use std::time::Duration;

use async_trait::async_trait;
use shared::billing::{
    BillingAddress, CustomerMapping, PriceRecord, ProductRecord, SubscriptionRecord, User,
};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::{Store, StoreResult};

/// PostgreSQL-backed [`Store`]
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect and run embedded migrations
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .connect(database_url)
            .await?;
        tracing::info!("Connected to PostgreSQL");

        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn find_user(&self, id: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, name, billing_address, payment_method FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn update_user_billing(
        &self,
        user_id: &str,
        address: Option<&BillingAddress>,
        payment_method: Option<&str>,
    ) -> StoreResult<()> {
        let address = address.map(serde_json::to_value).transpose()?;
        sqlx::query(
            "UPDATE users SET billing_address = COALESCE($1, billing_address), \
             payment_method = COALESCE($2, payment_method) WHERE id = $3",
        )
        .bind(address)
        .bind(payment_method)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_customer_by_user(&self, user_id: &str) -> StoreResult<Option<CustomerMapping>> {
        let row = sqlx::query_as::<_, CustomerMapping>(
            "SELECT id, user_id, stripe_customer_id, created_at FROM customers WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_customer_by_stripe_id(
        &self,
        stripe_customer_id: &str,
    ) -> StoreResult<Option<CustomerMapping>> {
        let row = sqlx::query_as::<_, CustomerMapping>(
            "SELECT id, user_id, stripe_customer_id, created_at FROM customers
             WHERE stripe_customer_id = $1",
        )
        .bind(stripe_customer_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn insert_customer(&self, mapping: CustomerMapping) -> StoreResult<CustomerMapping> {
        sqlx::query(
            "INSERT INTO customers (id, user_id, stripe_customer_id, created_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(mapping.id)
        .bind(&mapping.user_id)
        .bind(&mapping.stripe_customer_id)
        .bind(mapping.created_at)
        .execute(&self.pool)
        .await?;

        // Whichever insert won
        let stored = sqlx::query_as::<_, CustomerMapping>(
            "SELECT id, user_id, stripe_customer_id, created_at FROM customers WHERE user_id = $1",
        )
        .bind(&mapping.user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(stored)
    }

    async fn find_product(&self, product_id: &str) -> StoreResult<Option<ProductRecord>> {
        let row = sqlx::query_as::<_, ProductRecord>(
            "SELECT id, product_id, active, name, description, metadata
             FROM products WHERE product_id = $1",
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn save_product(&self, r: &ProductRecord) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO products (id, product_id, active, name, description, metadata)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (product_id) DO UPDATE SET
                active = EXCLUDED.active, name = EXCLUDED.name,
                description = EXCLUDED.description, metadata = EXCLUDED.metadata",
        )
        .bind(r.id)
        .bind(&r.product_id)
        .bind(r.active)
        .bind(&r.name)
        .bind(&r.description)
        .bind(&r.metadata)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_price(&self, price_id: &str) -> StoreResult<Option<PriceRecord>> {
        let row = sqlx::query_as::<_, PriceRecord>(
            r#"SELECT id, price_id, product_id, active, currency, description, price_type,
                unit_amount, "interval", interval_count, trial_period_days, metadata
             FROM prices WHERE price_id = $1"#,
        )
        .bind(price_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn save_price(&self, r: &PriceRecord) -> StoreResult<()> {
        sqlx::query(
            r#"INSERT INTO prices (id, price_id, product_id, active, currency, description,
                price_type, unit_amount, "interval", interval_count, trial_period_days, metadata)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             ON CONFLICT (price_id) DO UPDATE SET
                product_id = EXCLUDED.product_id, active = EXCLUDED.active,
                currency = EXCLUDED.currency, description = EXCLUDED.description,
                price_type = EXCLUDED.price_type, unit_amount = EXCLUDED.unit_amount,
                "interval" = EXCLUDED."interval", interval_count = EXCLUDED.interval_count,
                trial_period_days = EXCLUDED.trial_period_days, metadata = EXCLUDED.metadata"#,
        )
        .bind(r.id)
        .bind(&r.price_id)
        .bind(&r.product_id)
        .bind(r.active)
        .bind(&r.currency)
        .bind(&r.description)
        .bind(&r.price_type)
        .bind(r.unit_amount)
        .bind(&r.interval)
        .bind(r.interval_count)
        .bind(r.trial_period_days)
        .bind(&r.metadata)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_subscription(
        &self,
        subscription_id: &str,
    ) -> StoreResult<Option<SubscriptionRecord>> {
        let row = sqlx::query_as::<_, SubscriptionRecord>(
            "SELECT id, subscription_id, user_id, metadata, status, price_id, quantity,
                cancel_at_period_end, cancel_at, canceled_at, current_period_start,
                current_period_end, created, ended_at, trial_start, trial_end
             FROM subscriptions WHERE subscription_id = $1",
        )
        .bind(subscription_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn save_subscription(&self, r: &SubscriptionRecord) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO subscriptions (id, subscription_id, user_id, metadata, status, price_id,
                quantity, cancel_at_period_end, cancel_at, canceled_at, current_period_start,
                current_period_end, created, ended_at, trial_start, trial_end)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
             ON CONFLICT (subscription_id) DO UPDATE SET
                user_id = EXCLUDED.user_id, metadata = EXCLUDED.metadata,
                status = EXCLUDED.status, price_id = EXCLUDED.price_id,
                quantity = EXCLUDED.quantity,
                cancel_at_period_end = EXCLUDED.cancel_at_period_end,
                cancel_at = EXCLUDED.cancel_at, canceled_at = EXCLUDED.canceled_at,
                current_period_start = EXCLUDED.current_period_start,
                current_period_end = EXCLUDED.current_period_end,
                created = EXCLUDED.created, ended_at = EXCLUDED.ended_at,
                trial_start = EXCLUDED.trial_start, trial_end = EXCLUDED.trial_end",
        )
        .bind(r.id)
        .bind(&r.subscription_id)
        .bind(&r.user_id)
        .bind(&r.metadata)
        .bind(&r.status)
        .bind(&r.price_id)
        .bind(r.quantity)
        .bind(r.cancel_at_period_end)
        .bind(r.cancel_at)
        .bind(r.canceled_at)
        .bind(r.current_period_start)
        .bind(r.current_period_end)
        .bind(r.created)
        .bind(r.ended_at)
        .bind(r.trial_start)
        .bind(r.trial_end)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn is_event_processed(&self, event_id: &str) -> StoreResult<bool> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT event_id FROM processed_webhook_events WHERE event_id = $1")
                .bind(event_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.is_some())
    }

    async fn mark_event_processed(&self, event_id: &str, event_type: &str) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO processed_webhook_events (event_id, event_type, processed_at)
             VALUES ($1, $2, $3) ON CONFLICT (event_id) DO NOTHING",
        )
        .bind(event_id)
        .bind(event_type)
        .bind(shared::util::now_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
