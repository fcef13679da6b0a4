//! Postgres `LISTEN` change feed.
//!
//! Database triggers publish each row change as a JSON document on a
//! single NOTIFY channel. One listener connection per process receives
//! them and fans them out by table through a [`MemoryPubSub`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use geliom_core::config::RealtimeConfig;
use geliom_core::error::AppError;
use geliom_core::task::{LazyResource, LazyStatus, RetryPolicy, retry_until};

use super::{ChangeFeed, MemoryPubSub};
use crate::message::{ChangeEvent, FeedMessage};

/// Change feed backed by `LISTEN {notify_channel}`.
///
/// The listener connects on the first subscription. A lost connection is
/// re-established with bounded retries; subscribers receive
/// [`FeedMessage::Resync`] afterwards since changes may have been missed.
pub struct PgChangeFeed {
    pool: PgPool,
    channel: String,
    policy: RetryPolicy,
    hub: Arc<MemoryPubSub>,
    listener: LazyResource<JoinHandle<()>>,
    shutdown: CancellationToken,
}

impl std::fmt::Debug for PgChangeFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgChangeFeed")
            .field("channel", &self.channel)
            .field("listener", &self.listener)
            .finish_non_exhaustive()
    }
}

impl PgChangeFeed {
    pub fn new(pool: PgPool, config: &RealtimeConfig) -> Self {
        Self {
            pool,
            channel: config.notify_channel.clone(),
            policy: reconnect_policy(config),
            hub: Arc::new(MemoryPubSub::new(config.channel_buffer_size)),
            listener: LazyResource::new("change-feed-listener"),
            shutdown: CancellationToken::new(),
        }
    }

    /// The fan-out hub fed by the listener.
    pub fn hub(&self) -> &Arc<MemoryPubSub> {
        &self.hub
    }

    /// Stop listening. Subscribers see their streams close.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    async fn ensure_listening(&self) -> Result<(), AppError> {
        if self.shutdown.is_cancelled() {
            return Err(AppError::service_unavailable("Change feed is shut down"));
        }
        self.revive_stale_listener();

        let pool = self.pool.clone();
        let channel = self.channel.clone();
        let policy = self.policy;
        let hub = Arc::clone(&self.hub);
        let shutdown = self.shutdown.clone();

        self.listener
            .get_or_init(move || async move {
                let listener = connect(&pool, &channel, policy).await?;
                info!(channel = %channel, "Change feed listening");
                Ok(tokio::spawn(pump(listener, pool, channel, policy, hub, shutdown)))
            })
            .await
            .map(|_| ())
    }
}

impl PgChangeFeed {
    /// Forget a listener that can no longer deliver: one whose pump has
    /// exited, or whose initial connect failed. The next subscription then
    /// connects again.
    fn revive_stale_listener(&self) {
        let stale = match self.listener.status() {
            LazyStatus::Failed => true,
            LazyStatus::Ready => self
                .listener
                .get()
                .is_some_and(|handle| handle.is_finished()),
            LazyStatus::Uninitialized | LazyStatus::Initializing => false,
        };
        if stale {
            info!(channel = %self.channel, "Restarting change feed listener");
            self.listener.reset();
        }
    }
}

#[async_trait]
impl ChangeFeed for PgChangeFeed {
    async fn subscribe(&self, table: &str) -> Result<broadcast::Receiver<FeedMessage>, AppError> {
        let rx = self.hub.subscribe_table(table).await;
        self.ensure_listening().await?;
        Ok(rx)
    }
}

fn reconnect_policy(config: &RealtimeConfig) -> RetryPolicy {
    RetryPolicy::new(
        config.reconnect_attempts,
        Duration::from_millis(config.reconnect_delay_ms),
    )
}

async fn connect(pool: &PgPool, channel: &str, policy: RetryPolicy) -> Result<PgListener, AppError> {
    retry_until(policy, |attempt| async move {
        let mut listener = match PgListener::connect_with(pool).await {
            Ok(listener) => listener,
            Err(e) => {
                warn!(attempt, error = %e, "Change feed connection failed");
                return None;
            }
        };
        match listener.listen(channel).await {
            Ok(()) => Some(listener),
            Err(e) => {
                warn!(attempt, channel, error = %e, "LISTEN failed");
                None
            }
        }
    })
    .await
    .into_result("change feed listener")
}

async fn pump(
    mut listener: PgListener,
    pool: PgPool,
    channel: String,
    policy: RetryPolicy,
    hub: Arc<MemoryPubSub>,
    shutdown: CancellationToken,
) {
    loop {
        let received = tokio::select! {
            _ = shutdown.cancelled() => break,
            received = listener.recv() => received,
        };

        match received {
            Ok(notification) => match ChangeEvent::from_json(notification.payload()) {
                Ok(event) => {
                    hub.publish(event).await;
                }
                Err(e) => warn!(channel = %channel, error = %e, "Discarding malformed change payload"),
            },
            Err(e) => {
                warn!(channel = %channel, error = %e, "Change feed connection lost");
                match connect(&pool, &channel, policy).await {
                    Ok(fresh) => {
                        listener = fresh;
                        info!(channel = %channel, "Change feed reconnected");
                        hub.resync_all().await;
                    }
                    Err(e) => {
                        error!(channel = %channel, error = %e, "Change feed stopped");
                        break;
                    }
                }
            }
        }
    }
    hub.close_all().await;
}
