//! Unified error system for the billing hooks service
//!
//! This module provides:
//! - [`ErrorCode`]: Standardized error codes for all error types
//! - [`ErrorKind`]: The caller-visible kind each code belongs to
//! - [`ErrorCategory`]: Classification of errors by code range
//! - [`AppError`]: Rich error type with codes, messages, and details
//! - [`FailureBody`]: The `{"failure": ...}` response body
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Checkout errors
//! - 3xxx: Customer errors
//! - 4xxx: Webhook errors
//! - 5xxx: Payment provider errors
//! - 9xxx: System errors
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode, ErrorKind, FailureBody};
//!
//! let err = AppError::new(ErrorCode::CustomerNotFound)
//!     .with_detail("stripe_customer_id", "cus_123");
//! assert_eq!(err.kind(), ErrorKind::NotFound);
//!
//! let body = FailureBody::from(&err);
//! assert_eq!(body.failure, "no customer");
//! ```

mod category;
mod codes;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, ErrorKind, InvalidErrorCode};
pub use types::{AppError, FailureBody};
