//! Shared types for the billing hooks service
//!
//! Error system, local mirror records of payment-processor objects, and
//! time helpers used by the service and its tests.

pub mod billing;
pub mod error;
pub mod util;

// Re-exports
pub use http;
pub use serde::{Deserialize, Serialize};
