//! Error types and failure response body

use super::codes::{ErrorCode, ErrorKind};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Application error with structured error code and details
///
/// This is the error type every endpoint returns:
/// - Standardized error codes via [`ErrorCode`]
/// - Human-readable messages
/// - Optional structured details for debugging
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    /// The error code identifying the type of error
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details (field-level errors, context, etc.)
    pub details: Option<HashMap<String, Value>>,
}

impl AppError {
    /// Create a new error with the default message for the error code
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
            details: None,
        }
    }

    /// Create a new error with a custom message
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Add a detail entry to this error
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// The error kind reported to callers
    pub fn kind(&self) -> ErrorKind {
        self.code.kind()
    }

    /// HTTP status for this error.
    ///
    /// Every failure is a 400, the only non-2xx status the callers of this
    /// service distinguish.
    pub fn http_status(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    // ==================== Convenience constructors ====================

    /// Create a not authenticated error
    pub fn not_authenticated() -> Self {
        Self::new(ErrorCode::NotAuthenticated)
    }

    /// Create an unsupported event error
    pub fn unsupported_event(event_type: impl Into<String>) -> Self {
        Self::new(ErrorCode::UnsupportedEvent).with_detail("event_type", event_type.into())
    }

    /// Create a malformed event error
    pub fn malformed_event(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::MalformedEvent, msg)
    }

    /// Create a payment provider error
    pub fn provider(code: ErrorCode, msg: impl Into<String>) -> Self {
        Self::new(code).with_detail("provider", msg.into())
    }
}

/// Body of every failed response: `{"failure": "...", "code": 4002}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureBody {
    /// Short human-readable failure message
    pub failure: String,
    /// Machine-readable error code
    pub code: ErrorCode,
    /// Error kind the code belongs to
    pub kind: ErrorKind,
    /// Additional error details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Value>>,
}

impl From<&AppError> for FailureBody {
    fn from(err: &AppError) -> Self {
        Self {
            failure: err.message.clone(),
            code: err.code,
            kind: err.code.kind(),
            details: err.details.clone(),
        }
    }
}

// ===== Axum Integration =====

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;

        let status = self.http_status();
        let body = FailureBody::from(&self);

        // Transient errors are redelivered by the processor
        let category = self.code.category().name();
        if self.code.is_retryable() {
            tracing::error!(
                code = %self.code,
                category,
                message = %self.message,
                "Retryable error occurred"
            );
        } else {
            tracing::warn!(
                code = %self.code,
                category,
                message = %self.message,
                "Request failed"
            );
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_new() {
        let err = AppError::new(ErrorCode::CustomerNotFound);
        assert_eq!(err.code, ErrorCode::CustomerNotFound);
        assert_eq!(err.message, "no customer");
        assert!(err.details.is_none());
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_app_error_with_detail() {
        let err = AppError::new(ErrorCode::RequiredField)
            .with_detail("field", "price.id")
            .with_detail("reason", "required");

        assert_eq!(err.kind(), ErrorKind::Validation);
        let details = err.details.unwrap();
        assert_eq!(details.get("field").unwrap(), "price.id");
        assert_eq!(details.get("reason").unwrap(), "required");
    }

    #[test]
    fn test_every_failure_is_bad_request() {
        for code in [
            ErrorCode::NotAuthenticated,
            ErrorCode::InvalidPriceType,
            ErrorCode::SignatureInvalid,
            ErrorCode::CustomerNotFound,
            ErrorCode::DatabaseError,
            ErrorCode::UnsupportedEvent,
        ] {
            assert_eq!(AppError::new(code).http_status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn test_into_response_status() {
        use axum::response::IntoResponse;

        for code in [ErrorCode::DatabaseError, ErrorCode::UserNotFound] {
            let response = AppError::new(code).into_response();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn test_unsupported_event_detail() {
        let err = AppError::unsupported_event("invoice.paid");
        assert_eq!(err.kind(), ErrorKind::UnsupportedEvent);
        assert_eq!(
            err.details.unwrap().get("event_type").unwrap(),
            "invoice.paid"
        );
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::with_message(ErrorCode::InvalidRequest, "Could not create new session");
        assert_eq!(format!("{}", err), "Could not create new session");
    }

    #[test]
    fn test_failure_body_serialize() {
        let err = AppError::new(ErrorCode::SignatureInvalid);
        let json = serde_json::to_value(FailureBody::from(&err)).unwrap();
        assert_eq!(json["failure"], "webhook verification failed");
        assert_eq!(json["code"], 4002);
        assert_eq!(json["kind"], "signature");
        assert!(json.get("details").is_none());
    }
}
