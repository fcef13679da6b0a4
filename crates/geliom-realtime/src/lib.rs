//! # geliom-realtime
//!
//! Keeps a client's [`QueryCache`](geliom_cache::QueryCache) consistent with
//! the database without refetching on every change:
//!
//! - Change feeds: an in-process pub/sub and a Postgres `LISTEN` bridge
//! - Event filtering: scope relevance and self-change suppression
//! - Bespoke in-place patch rules for statuses, moods, nicknames and join
//!   requests, with a stale-marking fallback for every other table
//! - Per (table, scope) subscriptions with an explicit lifecycle

pub mod bridge;
pub mod channel;
pub mod filter;
pub mod manager;
pub mod message;
pub mod subscription;
pub mod sync;

#[cfg(test)]
mod test_support;

pub use bridge::{ChangeFeed, MemoryPubSub, PgChangeFeed};
pub use channel::ChannelSpec;
pub use manager::SubscriptionManager;
pub use message::{ChangeEvent, ChangeKind, FeedMessage};
pub use subscription::{Subscription, SubscriptionState};
pub use sync::{CacheSynchronizer, IgnoreReason, SyncAction};
