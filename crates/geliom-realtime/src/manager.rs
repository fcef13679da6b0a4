//! Subscription registry: at most one live subscription per (table, scope).

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::info;

use geliom_cache::Scope;
use geliom_core::types::GroupId;

use crate::bridge::ChangeFeed;
use crate::channel::{ChannelSpec, tables};
use crate::subscription::{Subscription, SubscriptionState};
use crate::sync::CacheSynchronizer;

/// Owns every subscription of one client.
pub struct SubscriptionManager {
    feed: Arc<dyn ChangeFeed>,
    sync: Arc<CacheSynchronizer>,
    subscriptions: DashMap<ChannelSpec, Subscription>,
}

impl std::fmt::Debug for SubscriptionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionManager")
            .field("subscriptions", &self.subscriptions.len())
            .finish_non_exhaustive()
    }
}

impl SubscriptionManager {
    pub fn new(feed: Arc<dyn ChangeFeed>, sync: Arc<CacheSynchronizer>) -> Self {
        Self {
            feed,
            sync,
            subscriptions: DashMap::new(),
        }
    }

    pub fn synchronizer(&self) -> &Arc<CacheSynchronizer> {
        &self.sync
    }

    /// Start a subscription for `spec` unless a live one exists.
    ///
    /// A subscription that has already torn down (its feed failed or
    /// closed) is replaced. Returns whether a new one was started.
    pub fn ensure(&self, spec: ChannelSpec) -> bool {
        match self.subscriptions.entry(spec.clone()) {
            Entry::Occupied(mut entry) => {
                if entry.get().state() != SubscriptionState::TornDown {
                    return false;
                }
                entry.insert(self.start(spec));
                true
            }
            Entry::Vacant(entry) => {
                entry.insert(self.start(spec));
                true
            }
        }
    }

    /// Subscribe to every table a group dashboard depends on.
    pub fn ensure_group(&self, group_id: GroupId) -> usize {
        tables::GROUP_TABLES
            .iter()
            .filter(|table| self.ensure(ChannelSpec::group(**table, group_id)))
            .count()
    }

    /// Tear down every subscription of `scope` and drop its cached queries.
    pub async fn release_scope(&self, scope: Scope) -> usize {
        let specs: Vec<ChannelSpec> = self
            .subscriptions
            .iter()
            .filter(|entry| entry.key().scope == scope)
            .map(|entry| entry.key().clone())
            .collect();

        let released = self.teardown_all(specs).await;
        let dropped = self.sync.cache().remove_scope(scope);
        info!(scope = %scope, released, dropped, "Released scope");
        released
    }

    /// Tear down everything.
    pub async fn shutdown(&self) {
        let specs: Vec<ChannelSpec> = self
            .subscriptions
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        let released = self.teardown_all(specs).await;
        info!(released, "Subscription manager shut down");
    }

    pub fn state(&self, spec: &ChannelSpec) -> Option<SubscriptionState> {
        self.subscriptions.get(spec).map(|entry| entry.state())
    }

    /// Number of subscriptions not yet torn down.
    pub fn active_count(&self) -> usize {
        self.subscriptions
            .iter()
            .filter(|entry| entry.state() != SubscriptionState::TornDown)
            .count()
    }

    fn start(&self, spec: ChannelSpec) -> Subscription {
        Subscription::start(spec, Arc::clone(&self.feed), Arc::clone(&self.sync))
    }

    async fn teardown_all(&self, specs: Vec<ChannelSpec>) -> usize {
        let mut released = 0;
        for spec in specs {
            if let Some((_, subscription)) = self.subscriptions.remove(&spec) {
                subscription.teardown().await;
                released += 1;
            }
        }
        released
    }
}

#[cfg(test)]
mod tests {
    use geliom_cache::{QueryCache, QueryKey};
    use geliom_core::types::UserId;
    use serde_json::json;

    use super::*;
    use crate::bridge::MemoryPubSub;
    use crate::message::ChangeEvent;
    use crate::test_support::{NoLookups, dashboard, eventually};

    fn nickname(cache: &QueryCache, group: GroupId, user: UserId) -> Option<String> {
        cache
            .read(&QueryKey::dashboard(group), |d| {
                d.as_dashboard()?.member(user)?.nickname.clone()
            })
            .flatten()
    }

    #[tokio::test]
    async fn test_one_subscription_per_table_and_scope() {
        let hub = Arc::new(MemoryPubSub::new(8));
        let sync = Arc::new(CacheSynchronizer::new(
            UserId::new(),
            Arc::new(QueryCache::new()),
            Arc::new(NoLookups),
        ));
        let manager = SubscriptionManager::new(hub, sync);
        let group = GroupId::new();

        assert_eq!(manager.ensure_group(group), tables::GROUP_TABLES.len());
        assert_eq!(manager.ensure_group(group), 0);
        assert!(manager.ensure(ChannelSpec::global(tables::USER_MOODS)));
        assert_eq!(manager.active_count(), tables::GROUP_TABLES.len() + 1);

        manager.shutdown().await;
        assert_eq!(manager.active_count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_scopes_stay_isolated() {
        let me = UserId::new();
        let other = UserId::new();
        let a = GroupId::new();
        let b = GroupId::new();
        let cache = Arc::new(QueryCache::new());
        cache.insert(QueryKey::dashboard(a), dashboard(a, &[me, other]));
        cache.insert(QueryKey::dashboard(b), dashboard(b, &[me, other]));
        let hub = Arc::new(MemoryPubSub::new(8));
        let sync = Arc::new(CacheSynchronizer::new(me, cache.clone(), Arc::new(NoLookups)));
        let manager = SubscriptionManager::new(hub.clone(), sync);

        manager.ensure_group(a);
        manager.ensure_group(b);
        let specs = [
            ChannelSpec::group(tables::NICKNAMES, a),
            ChannelSpec::group(tables::NICKNAMES, b),
        ];
        for spec in &specs {
            assert!(eventually(|| manager.state(spec) == Some(SubscriptionState::Active)).await);
        }

        hub.publish(ChangeEvent::update(
            tables::NICKNAMES,
            json!({ "user_id": other, "group_id": a, "nickname": "Abi" }),
            None,
        ))
        .await;

        assert!(eventually(|| nickname(&cache, a, other).is_some()).await);
        assert_eq!(nickname(&cache, b, other), None);
        assert!(!cache.is_stale(&QueryKey::dashboard(b)));

        assert_eq!(manager.release_scope(Scope::Group(a)).await, tables::GROUP_TABLES.len());
        assert!(!cache.contains(&QueryKey::dashboard(a)));
        assert!(cache.contains(&QueryKey::dashboard(b)));
        assert_eq!(manager.active_count(), tables::GROUP_TABLES.len());

        manager.shutdown().await;
    }
}
