use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Billing type of a processor price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceType {
    /// Billed once; checkout runs in `payment` mode
    OneTime,
    /// Billed per interval; checkout runs in `subscription` mode
    Recurring,
}

impl PriceType {
    /// Parse from database/wire string value
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "one_time" => Some(Self::OneTime),
            "recurring" => Some(Self::Recurring),
            _ => None,
        }
    }

    /// Database/wire string representation
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::OneTime => "one_time",
            Self::Recurring => "recurring",
        }
    }
}

/// Recurring billing interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceInterval {
    Day,
    Week,
    Month,
    Year,
}

impl PriceInterval {
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }
}

/// Price mirror, keyed by `price_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PriceRecord {
    pub id: Uuid,
    pub price_id: String,
    pub product_id: String,
    pub active: bool,
    pub currency: String,
    /// Price nickname, empty string when unset
    pub description: String,
    /// `one_time` or `recurring`
    pub price_type: String,
    /// Smallest currency unit; `None` for custom/tiered prices
    pub unit_amount: Option<i64>,
    // Recurring prices only
    pub interval: Option<String>,
    pub interval_count: Option<i64>,
    pub trial_period_days: Option<i64>,
    pub metadata: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_type_db_roundtrip() {
        assert_eq!(PriceType::from_db("recurring"), Some(PriceType::Recurring));
        assert_eq!(PriceType::from_db("one_time"), Some(PriceType::OneTime));
        assert_eq!(PriceType::from_db("tiered"), None);
        assert_eq!(PriceType::Recurring.as_db(), "recurring");
    }

    #[test]
    fn test_price_type_serde() {
        let t: PriceType = serde_json::from_str("\"one_time\"").unwrap();
        assert_eq!(t, PriceType::OneTime);
        assert!(serde_json::from_str::<PriceType>("\"metered\"").is_err());
    }
}
