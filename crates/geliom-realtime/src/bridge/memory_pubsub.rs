//! In-process pub/sub.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::sync::broadcast;

use geliom_core::error::AppError;

use super::ChangeFeed;
use crate::message::{ChangeEvent, FeedMessage};

/// Per-table broadcast channels.
#[derive(Debug)]
pub struct MemoryPubSub {
    /// Table name → broadcast sender
    channels: RwLock<HashMap<String, broadcast::Sender<FeedMessage>>>,
    buffer_size: usize,
}

impl MemoryPubSub {
    pub fn new(buffer_size: usize) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            buffer_size: buffer_size.max(1),
        }
    }

    /// Publish a change to the subscribers of its table.
    ///
    /// Returns the number of receivers reached; changes on tables nobody
    /// subscribed to are dropped.
    pub async fn publish(&self, event: ChangeEvent) -> usize {
        let channels = self.channels.read().await;
        match channels.get(&event.table) {
            Some(tx) => tx.send(FeedMessage::Change(event)).unwrap_or(0),
            None => 0,
        }
    }

    /// Tell every subscriber that changes may have been missed.
    pub async fn resync_all(&self) {
        let channels = self.channels.read().await;
        for tx in channels.values() {
            let _ = tx.send(FeedMessage::Resync);
        }
    }

    /// Drop every channel; current receivers observe the stream closing.
    pub async fn close_all(&self) {
        self.channels.write().await.clear();
    }

    /// Subscribe to one table.
    pub async fn subscribe_table(&self, table: &str) -> broadcast::Receiver<FeedMessage> {
        let mut channels = self.channels.write().await;
        channels
            .entry(table.to_string())
            .or_insert_with(|| broadcast::channel(self.buffer_size).0)
            .subscribe()
    }

    /// Number of tables with a channel.
    pub async fn table_count(&self) -> usize {
        self.channels.read().await.len()
    }
}

#[async_trait]
impl ChangeFeed for MemoryPubSub {
    async fn subscribe(&self, table: &str) -> Result<broadcast::Receiver<FeedMessage>, AppError> {
        Ok(self.subscribe_table(table).await)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_table_subscribers_only() {
        let hub = MemoryPubSub::new(8);
        let mut moods = hub.subscribe_table("user_moods").await;
        let mut nicknames = hub.subscribe_table("nicknames").await;

        let event = ChangeEvent::insert("user_moods", json!({}));
        assert_eq!(hub.publish(event.clone()).await, 1);

        assert_eq!(moods.recv().await.unwrap(), FeedMessage::Change(event));
        assert!(nicknames.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_close_all_ends_streams() {
        let hub = MemoryPubSub::new(8);
        let mut rx = hub.subscribe_table("user_moods").await;
        hub.resync_all().await;
        hub.close_all().await;

        assert_eq!(rx.recv().await.unwrap(), FeedMessage::Resync);
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_unsubscribed_table_is_dropped() {
        let hub = MemoryPubSub::new(8);
        assert_eq!(hub.publish(ChangeEvent::insert("groups", json!({}))).await, 0);
        assert_eq!(hub.table_count().await, 0);
    }
}
