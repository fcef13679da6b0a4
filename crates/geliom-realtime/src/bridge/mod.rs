//! Change feed sources.

pub mod memory_pubsub;
pub mod pg_listener;

use async_trait::async_trait;
use tokio::sync::broadcast;

use geliom_core::error::AppError;

use crate::message::FeedMessage;

pub use memory_pubsub::MemoryPubSub;
pub use pg_listener::PgChangeFeed;

/// A source of row change events, one stream per table.
#[async_trait]
pub trait ChangeFeed: Send + Sync {
    /// Start receiving every change on `table`.
    async fn subscribe(&self, table: &str) -> Result<broadcast::Receiver<FeedMessage>, AppError>;
}
