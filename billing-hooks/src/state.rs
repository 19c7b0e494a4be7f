//! Application state

use std::sync::Arc;

use crate::config::Config;
use crate::db::{MemoryStore, PgStore, Store};
use crate::stripe::{PaymentProvider, StripeClient, StripeSettings};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// `DATABASE_URL` value selecting the in-process store
pub const MEMORY_DATABASE_URL: &str = "memory://";

/// Shared application state
///
/// Cloned per request by axum; every field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub payments: Arc<dyn PaymentProvider>,
    pub stripe: Arc<StripeSettings>,
    pub auth_token_secret: String,
}

impl AppState {
    /// Create a new AppState
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let store: Arc<dyn Store> = if config.database_url == MEMORY_DATABASE_URL {
            tracing::warn!("Using in-memory store; records are lost on restart");
            Arc::new(MemoryStore::new())
        } else {
            Arc::new(PgStore::connect(&config.database_url).await?)
        };

        let stripe = Arc::new(config.stripe.clone());
        let payments = Arc::new(StripeClient::new(stripe.clone())?);

        Ok(Self::from_parts(
            store,
            payments,
            stripe,
            config.auth_token_secret.clone(),
        ))
    }

    /// Assemble state from explicit collaborators
    pub fn from_parts(
        store: Arc<dyn Store>,
        payments: Arc<dyn PaymentProvider>,
        stripe: Arc<StripeSettings>,
        auth_token_secret: String,
    ) -> Self {
        Self {
            store,
            payments,
            stripe,
            auth_token_secret,
        }
    }
}
