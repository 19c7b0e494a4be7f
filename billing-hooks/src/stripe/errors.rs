//! Stripe error types and mappings

use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use thiserror::Error;

/// Stripe REST error envelope: `{ error: { type, code, message, param } }`
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorEnvelope {
    pub error: StripeErrorDetails,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorDetails {
    #[serde(rename = "type")]
    pub type_: String,
    pub code: Option<String>,
    pub message: Option<String>,
    pub param: Option<String>,
}

impl StripeErrorEnvelope {
    pub fn into_api_error(self, status: u16) -> StripeApiError {
        StripeApiError::Stripe {
            type_: self.error.type_,
            message: self.error.message,
            code: self.error.code,
            param: self.error.param,
            status,
        }
    }
}

#[derive(Debug, Error)]
pub enum StripeApiError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("stripe error: {type_} status={status} message={message:?} code={code:?} param={param:?}")]
    Stripe {
        type_: String,
        message: Option<String>,
        code: Option<String>,
        param: Option<String>,
        status: u16,
    },
}

impl StripeApiError {
    /// Map into an `AppError` with the endpoint-specific code
    pub fn into_app_error(self, code: ErrorCode) -> AppError {
        tracing::error!(error = %self, "Stripe API request failed");
        AppError::provider(code, self.to_string())
    }
}

/// Webhook signature verification failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("missing Stripe-Signature header")]
    Missing,
    #[error("invalid Stripe-Signature header")]
    Malformed,
    #[error("webhook signature mismatch")]
    Mismatch,
    #[error("webhook timestamp outside tolerance")]
    Expired,
}

impl From<SignatureError> for AppError {
    fn from(e: SignatureError) -> Self {
        let code = match e {
            SignatureError::Missing => ErrorCode::SignatureMissing,
            SignatureError::Malformed | SignatureError::Mismatch => ErrorCode::SignatureInvalid,
            SignatureError::Expired => ErrorCode::SignatureExpired,
        };
        AppError::new(code)
    }
}
