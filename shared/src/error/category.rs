//! Error category classification

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Error category classification based on error code ranges
///
/// Categories are determined by the leading digit of the error code:
/// - 0xxx: General errors
/// - 1xxx: Authentication errors
/// - 2xxx: Checkout errors
/// - 3xxx: Customer errors
/// - 4xxx: Webhook errors
/// - 5xxx: Payment provider errors
/// - 9xxx: System errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// General errors (0xxx)
    General,
    /// Authentication errors (1xxx)
    Auth,
    /// Checkout errors (2xxx)
    Checkout,
    /// Customer errors (3xxx)
    Customer,
    /// Webhook errors (4xxx)
    Webhook,
    /// Payment provider errors (5xxx)
    Provider,
    /// System errors (6xxx and up)
    System,
}

impl ErrorCategory {
    /// Determine category from error code value
    pub fn from_code(code: u16) -> Self {
        match code {
            0..1000 => Self::General,
            1000..2000 => Self::Auth,
            2000..3000 => Self::Checkout,
            3000..4000 => Self::Customer,
            4000..5000 => Self::Webhook,
            5000..6000 => Self::Provider,
            _ => Self::System,
        }
    }

    /// Get the string name for this category
    pub fn name(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Auth => "auth",
            Self::Checkout => "checkout",
            Self::Customer => "customer",
            Self::Webhook => "webhook",
            Self::Provider => "provider",
            Self::System => "system",
        }
    }
}

impl ErrorCode {
    /// Get the category for this error code
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}
