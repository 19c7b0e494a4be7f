use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Local user record, owned by the backend platform
///
/// Only the billing fields are written by this service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    /// JSON-encoded [`BillingAddress`]
    pub billing_address: Option<Value>,
    /// Default payment method type, e.g. `card`
    pub payment_method: Option<String>,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
            name: None,
            billing_address: None,
            payment_method: None,
        }
    }

    /// Decoded billing address, if one has been written
    pub fn address(&self) -> Option<BillingAddress> {
        self.billing_address
            .as_ref()
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// Postal address as reported by the processor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingAddress {
    pub city: Option<String>,
    pub country: Option<String>,
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub postal_code: Option<String>,
    pub state: Option<String>,
}
