//! Authentication middleware for platform user requests

pub mod user_auth;

pub use user_auth::{UserIdentity, create_token, user_auth_middleware, verify_token};
