use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One-to-one link between a local user and a processor customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CustomerMapping {
    pub id: Uuid,
    pub user_id: String,
    pub stripe_customer_id: String,
    pub created_at: DateTime<Utc>,
}

impl CustomerMapping {
    pub fn new(user_id: impl Into<String>, stripe_customer_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            stripe_customer_id: stripe_customer_id.into(),
            created_at: Utc::now(),
        }
    }
}
