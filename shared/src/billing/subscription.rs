use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Subscription status the mirror is created with when only the id is known
pub const INITIAL_SUBSCRIPTION_STATUS: &str = "incomplete";

/// Subscription mirror, keyed by `subscription_id`
///
/// Timestamps are stored as absolute UTC instants, never raw epoch seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct SubscriptionRecord {
    pub id: Uuid,
    pub subscription_id: String,
    /// Owning local user, resolved through the customer mapping
    pub user_id: String,
    pub metadata: Value,
    pub status: String,
    pub price_id: Option<String>,
    pub quantity: Option<i64>,
    pub cancel_at_period_end: bool,
    pub cancel_at: Option<DateTime<Utc>>,
    pub canceled_at: Option<DateTime<Utc>>,
    pub current_period_start: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub created: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub trial_start: Option<DateTime<Utc>>,
    pub trial_end: Option<DateTime<Utc>>,
}

impl SubscriptionRecord {
    /// A fresh mirror for a subscription known only by id
    pub fn placeholder(subscription_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            subscription_id: subscription_id.into(),
            user_id: user_id.into(),
            metadata: Value::Object(Default::default()),
            status: INITIAL_SUBSCRIPTION_STATUS.to_string(),
            price_id: None,
            quantity: None,
            cancel_at_period_end: false,
            cancel_at: None,
            canceled_at: None,
            current_period_start: None,
            current_period_end: None,
            created: None,
            ended_at: None,
            trial_start: None,
            trial_end: None,
        }
    }
}
