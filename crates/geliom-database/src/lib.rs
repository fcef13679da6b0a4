//! # geliom-database
//!
//! PostgreSQL connection management, the store traits the service layer is
//! written against, and the sqlx repositories that implement them on top of
//! the hosted tables and stored procedures.

pub mod connection;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use store::{
    DashboardSource, LookupSource, MembershipStore, PendingNotificationStore, RateLimitDecision,
    RateLimitQuery, RateLimitStore, RateLimitStoreError, UserDirectory,
};
