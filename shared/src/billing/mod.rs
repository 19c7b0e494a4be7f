//! Local mirror records of payment-processor objects
//!
//! Every mirror carries a local `id` (allocated on first insert, kept on
//! update) and the processor's external id, which is unique per kind.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.

pub mod customer;
pub mod price;
pub mod product;
pub mod subscription;
pub mod user;

// Re-exports
pub use customer::*;
pub use price::*;
pub use product::*;
pub use subscription::*;
pub use user::*;
