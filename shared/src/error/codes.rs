//! Unified error codes for the billing hooks service
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Checkout errors
//! - 3xxx: Customer errors
//! - 4xxx: Webhook errors
//! - 5xxx: Payment provider errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so clients can match on
/// them without parsing the human-readable message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Invalid request
    InvalidRequest = 5,
    /// Required field missing
    RequiredField = 7,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Token is valid but the user record is gone
    UserNotFound = 1005,

    // ==================== 2xxx: Checkout ====================
    /// Price type is neither `recurring` nor `one_time`
    InvalidPriceType = 2001,
    /// Quantity must be at least one
    InvalidQuantity = 2002,

    // ==================== 3xxx: Customer ====================
    /// No customer mapping for a processor customer id
    CustomerNotFound = 3001,
    /// Could not create or store a processor customer
    CustomerCreateFailed = 3002,

    // ==================== 4xxx: Webhook ====================
    /// Stripe-Signature header missing
    SignatureMissing = 4001,
    /// Stripe-Signature header does not match the payload
    SignatureInvalid = 4002,
    /// Stripe-Signature timestamp outside tolerance
    SignatureExpired = 4003,
    /// Event type is not handled
    UnsupportedEvent = 4004,
    /// Event payload does not fit its declared type
    MalformedEvent = 4005,

    // ==================== 5xxx: Payment provider ====================
    /// Checkout session creation failed
    CheckoutSessionFailed = 5001,
    /// Billing portal session creation failed
    PortalSessionFailed = 5002,

    // ==================== 9xxx: System ====================
    /// Database error
    DatabaseError = 9002,
}

/// The error kinds surfaced by the HTTP endpoints.
///
/// Every [`ErrorCode`] maps onto exactly one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Auth,
    Validation,
    Signature,
    NotFound,
    Persistence,
    UnsupportedEvent,
    Provider,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::RequiredField => "Required field is missing",

            // Auth
            ErrorCode::NotAuthenticated => "Could not get user",
            ErrorCode::UserNotFound => "Could not get user",

            // Checkout
            ErrorCode::InvalidPriceType => "Could not create new session",
            ErrorCode::InvalidQuantity => "Quantity must be at least 1",

            // Customer
            ErrorCode::CustomerNotFound => "no customer",
            ErrorCode::CustomerCreateFailed => "Could not create new customer",

            // Webhook
            ErrorCode::SignatureMissing => "missing Stripe-Signature header",
            ErrorCode::SignatureInvalid => "webhook verification failed",
            ErrorCode::SignatureExpired => "webhook timestamp outside tolerance",
            ErrorCode::UnsupportedEvent => "didn't receive a valid event",
            ErrorCode::MalformedEvent => "failed to parse the stripe event",

            // Payment provider
            ErrorCode::CheckoutSessionFailed => "Could not create new session",
            ErrorCode::PortalSessionFailed => "Could not create new session",

            // System
            ErrorCode::DatabaseError => "couldn't persist record",
        }
    }

    /// The error kind this code is reported as
    pub const fn kind(&self) -> ErrorKind {
        match self {
            ErrorCode::NotAuthenticated | ErrorCode::UserNotFound => ErrorKind::Auth,

            ErrorCode::InvalidRequest
            | ErrorCode::RequiredField
            | ErrorCode::InvalidPriceType
            | ErrorCode::InvalidQuantity
            | ErrorCode::MalformedEvent => ErrorKind::Validation,

            ErrorCode::SignatureMissing
            | ErrorCode::SignatureInvalid
            | ErrorCode::SignatureExpired => ErrorKind::Signature,

            ErrorCode::CustomerNotFound => ErrorKind::NotFound,

            ErrorCode::DatabaseError => ErrorKind::Persistence,

            ErrorCode::UnsupportedEvent => ErrorKind::UnsupportedEvent,

            ErrorCode::CustomerCreateFailed
            | ErrorCode::CheckoutSessionFailed
            | ErrorCode::PortalSessionFailed => ErrorKind::Provider,
        }
    }

    /// Whether the same request may succeed if redelivered later.
    ///
    /// Storage and provider failures are transient; everything else is a
    /// property of the request itself.
    pub const fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Persistence | ErrorKind::Provider)
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            5 => Ok(ErrorCode::InvalidRequest),
            7 => Ok(ErrorCode::RequiredField),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1005 => Ok(ErrorCode::UserNotFound),

            // Checkout
            2001 => Ok(ErrorCode::InvalidPriceType),
            2002 => Ok(ErrorCode::InvalidQuantity),

            // Customer
            3001 => Ok(ErrorCode::CustomerNotFound),
            3002 => Ok(ErrorCode::CustomerCreateFailed),

            // Webhook
            4001 => Ok(ErrorCode::SignatureMissing),
            4002 => Ok(ErrorCode::SignatureInvalid),
            4003 => Ok(ErrorCode::SignatureExpired),
            4004 => Ok(ErrorCode::UnsupportedEvent),
            4005 => Ok(ErrorCode::MalformedEvent),

            // Payment provider
            5001 => Ok(ErrorCode::CheckoutSessionFailed),
            5002 => Ok(ErrorCode::PortalSessionFailed),

            // System
            9002 => Ok(ErrorCode::DatabaseError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
