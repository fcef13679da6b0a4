//! Lifecycle of one (table, scope) subscription.
//!
//! ```text
//! Subscribing ──feed ready──▶ Active ──teardown / feed closed──▶ TornDown
//!      └───────────feed failed / teardown──────────────────────────▲
//! ```
//!
//! Events are applied one at a time in delivery order. Once teardown has
//! been requested nothing more reaches the cache, including an event whose
//! patch was already in flight.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, warn};

use crate::bridge::ChangeFeed;
use crate::channel::ChannelSpec;
use crate::message::FeedMessage;
use crate::sync::CacheSynchronizer;

/// Subscription state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    Subscribing,
    Active,
    TornDown,
}

/// A running subscription. Dropping it cancels the delivery task.
#[derive(Debug)]
pub struct Subscription {
    spec: ChannelSpec,
    state: Arc<watch::Sender<SubscriptionState>>,
    cancel: CancellationToken,
    task: JoinHandle<u64>,
    _guard: DropGuard,
}

impl Subscription {
    /// Subscribe to `spec.table` on `feed` and start applying its events.
    pub fn start(
        spec: ChannelSpec,
        feed: Arc<dyn ChangeFeed>,
        sync: Arc<CacheSynchronizer>,
    ) -> Self {
        let (state, _) = watch::channel(SubscriptionState::Subscribing);
        let state = Arc::new(state);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(deliver(
            spec.clone(),
            feed,
            sync,
            Arc::clone(&state),
            cancel.clone(),
        ));

        Self {
            spec,
            state,
            _guard: cancel.clone().drop_guard(),
            cancel,
            task,
        }
    }

    pub fn spec(&self) -> &ChannelSpec {
        &self.spec
    }

    pub fn state(&self) -> SubscriptionState {
        *self.state.borrow()
    }

    /// Wait until the subscription has left `Subscribing`.
    pub async fn settled(&self) -> SubscriptionState {
        let mut rx = self.state.subscribe();
        match rx
            .wait_for(|state| *state != SubscriptionState::Subscribing)
            .await
        {
            Ok(state) => *state,
            Err(_) => SubscriptionState::TornDown,
        }
    }

    /// Stop applying events and release the feed. Returns the number of
    /// events that were delivered.
    pub async fn teardown(self) -> u64 {
        self.state.send_replace(SubscriptionState::TornDown);
        self.cancel.cancel();
        let delivered = self.task.await.unwrap_or(0);
        info!(channel = %self.spec, delivered, "Subscription torn down");
        delivered
    }
}

async fn deliver(
    spec: ChannelSpec,
    feed: Arc<dyn ChangeFeed>,
    sync: Arc<CacheSynchronizer>,
    state: Arc<watch::Sender<SubscriptionState>>,
    cancel: CancellationToken,
) -> u64 {
    let subscribed = tokio::select! {
        biased;
        _ = cancel.cancelled() => return 0,
        subscribed = feed.subscribe(&spec.table) => subscribed,
    };
    let mut rx = match subscribed {
        Ok(rx) => rx,
        Err(e) => {
            warn!(channel = %spec, error = %e, "Subscription failed");
            sync.invalidate(spec.scope);
            state.send_replace(SubscriptionState::TornDown);
            return 0;
        }
    };

    let activated = state.send_if_modified(|current| {
        let subscribing = *current == SubscriptionState::Subscribing;
        if subscribing {
            *current = SubscriptionState::Active;
        }
        subscribing
    });
    if !activated {
        return 0;
    }
    info!(channel = %spec, "Subscription active");

    let mut delivered = 0;
    loop {
        let message = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            message = rx.recv() => message,
        };

        match message {
            Ok(FeedMessage::Change(event)) => {
                delivered += 1;
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = sync.apply(&event, spec.scope) => {}
                }
            }
            Ok(FeedMessage::Resync) => {
                debug!(channel = %spec, "Resync requested");
                sync.invalidate(spec.scope);
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(channel = %spec, skipped, "Subscription lagged; refetch required");
                sync.invalidate(spec.scope);
            }
            Err(RecvError::Closed) => break,
        }
    }

    state.send_replace(SubscriptionState::TornDown);
    delivered
}
