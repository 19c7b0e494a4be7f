use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Product mirror, keyed by `product_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ProductRecord {
    pub id: Uuid,
    pub product_id: String,
    pub active: bool,
    pub name: String,
    /// Empty string when the processor has none
    pub description: String,
    /// Always a JSON object
    pub metadata: Value,
}
