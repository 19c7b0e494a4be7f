//! billing-hooks: Stripe checkout, billing portal and webhook glue
//!
//! - Creates checkout and billing portal sessions for platform users
//! - Keeps one Stripe customer per local user
//! - Mirrors Stripe products, prices and subscriptions from webhook events

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod reconcile;
pub mod state;
pub mod stripe;

pub use config::Config;
pub use state::AppState;
