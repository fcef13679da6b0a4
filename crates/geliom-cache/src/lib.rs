//! # geliom-cache
//!
//! In-memory caches held by a client of the Geliom backend:
//!
//! - [`QueryCache`]: full query results (dashboards, join-request lists)
//!   keyed by entity kind and scope, patched in place by the realtime
//!   synchronizer and refetched when marked stale.
//! - [`MemoizedLookup`]: a [moka](https://crates.io/crates/moka) backed
//!   decorator that memoises point lookups of statuses, moods and profiles.

pub mod keys;
pub mod lookup;
pub mod query;

pub use keys::{QueryKey, QueryKind, Scope};
pub use lookup::MemoizedLookup;
pub use query::{QueryCache, QueryData};
