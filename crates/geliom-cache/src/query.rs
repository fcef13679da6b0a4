//! Keyed store of full query results.
//!
//! Entries are created by a successful fetch, patched in place by realtime
//! events, marked stale when a broader change makes them unreliable, and
//! removed when the owning subscription is torn down.

use std::future::Future;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;

use geliom_core::result::AppResult;
use geliom_entity::group::{DashboardData, JoinRequestView};

use crate::keys::{QueryKey, Scope};

/// Typed payload of a cached query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryData {
    /// A group dashboard.
    Dashboard(DashboardData),
    /// Pending join requests in server order.
    JoinRequests(Vec<JoinRequestView>),
}

impl QueryData {
    /// The dashboard, if this entry holds one.
    pub fn as_dashboard(&self) -> Option<&DashboardData> {
        match self {
            Self::Dashboard(data) => Some(data),
            _ => None,
        }
    }

    /// The join-request list, if this entry holds one.
    pub fn as_join_requests(&self) -> Option<&[JoinRequestView]> {
        match self {
            Self::JoinRequests(list) => Some(list),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct CachedQuery {
    data: QueryData,
    stale: bool,
    fetched_at: DateTime<Utc>,
}

/// In-memory query cache.
#[derive(Debug, Default)]
pub struct QueryCache {
    entries: DashMap<QueryKey, CachedQuery>,
}

impl QueryCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a freshly fetched result, replacing any previous entry.
    pub fn insert(&self, key: QueryKey, data: QueryData) {
        self.entries.insert(
            key,
            CachedQuery {
                data,
                stale: false,
                fetched_at: Utc::now(),
            },
        );
    }

    /// Current data for `key`, fresh or stale.
    pub fn get(&self, key: &QueryKey) -> Option<QueryData> {
        self.entries.get(key).map(|entry| entry.data.clone())
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Run `f` against the entry for `key` without cloning it.
    pub fn read<R>(&self, key: &QueryKey, f: impl FnOnce(&QueryData) -> R) -> Option<R> {
        self.entries.get(key).map(|entry| f(&entry.data))
    }

    /// Whether `key` is present and marked stale.
    pub fn is_stale(&self, key: &QueryKey) -> bool {
        self.entries.get(key).is_some_and(|entry| entry.stale)
    }

    /// When `key` was last fetched.
    pub fn fetched_at(&self, key: &QueryKey) -> Option<DateTime<Utc>> {
        self.entries.get(key).map(|entry| entry.fetched_at)
    }

    /// Return the cached data, running `fetch` when the entry is absent or
    /// stale. A failed fetch leaves any existing entry untouched.
    pub async fn get_or_fetch<F, Fut>(&self, key: QueryKey, fetch: F) -> AppResult<QueryData>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<QueryData>>,
    {
        if let Some(entry) = self.entries.get(&key) {
            if !entry.stale {
                return Ok(entry.data.clone());
            }
        }

        debug!(key = %key, "Fetching query");
        let data = fetch().await?;
        self.insert(key, data.clone());
        Ok(data)
    }

    /// Apply `patch` to the entry for `key` in place.
    ///
    /// Absent entries are left absent: a patch never creates an entry.
    /// Returns whether the closure ran and reported a change.
    pub fn patch<F>(&self, key: &QueryKey, patch: F) -> bool
    where
        F: FnOnce(&mut QueryData) -> bool,
    {
        match self.entries.get_mut(key) {
            Some(mut entry) => patch(&mut entry.data),
            None => false,
        }
    }

    /// Mark one entry stale. Returns whether it existed.
    pub fn invalidate(&self, key: &QueryKey) -> bool {
        match self.entries.get_mut(key) {
            Some(mut entry) => {
                entry.stale = true;
                true
            }
            None => false,
        }
    }

    /// Mark every entry of `scope` stale. Returns how many were marked.
    pub fn invalidate_scope(&self, scope: Scope) -> usize {
        let mut count = 0;
        for mut entry in self.entries.iter_mut() {
            if entry.key().scope == scope {
                entry.stale = true;
                count += 1;
            }
        }
        debug!(scope = %scope, count, "Invalidated scope");
        count
    }

    /// Drop every entry of `scope`. Returns how many were removed.
    pub fn remove_scope(&self, scope: Scope) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| key.scope != scope);
        before - self.entries.len()
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use geliom_core::error::AppError;
    use geliom_core::types::{GroupId, UserId};
    use geliom_entity::group::{DashboardMember, GroupSummary};

    use super::*;

    fn dashboard(group_id: GroupId, names: &[&str]) -> QueryData {
        QueryData::Dashboard(DashboardData {
            group: GroupSummary {
                id: group_id,
                name: "Aile".into(),
                owner_id: UserId::new(),
                invite_code: None,
            },
            members: names
                .iter()
                .map(|name| DashboardMember {
                    user_id: UserId::new(),
                    display_name: Some((*name).to_string()),
                    avatar_url: None,
                    nickname: None,
                    status: None,
                    mood: None,
                })
                .collect(),
        })
    }

    #[test]
    fn test_patch_never_creates_entries() {
        let cache = QueryCache::new();
        let key = QueryKey::dashboard(GroupId::new());
        assert!(!cache.patch(&key, |_| true));
        assert!(cache.get(&key).is_none());
    }

    #[test]
    fn test_patch_in_place_keeps_order() {
        let cache = QueryCache::new();
        let group = GroupId::new();
        let key = QueryKey::dashboard(group);
        cache.insert(key, dashboard(group, &["a", "b", "c"]));

        let patched = cache.patch(&key, |data| match data {
            QueryData::Dashboard(d) => {
                d.members[1].nickname = Some("bee".into());
                true
            }
            _ => false,
        });
        assert!(patched);

        let data = cache.get(&key).unwrap();
        let labels: Vec<_> = data
            .as_dashboard()
            .unwrap()
            .members
            .iter()
            .map(|m| m.label().to_string())
            .collect();
        assert_eq!(labels, vec!["a", "bee", "c"]);
    }

    #[tokio::test]
    async fn test_get_or_fetch_refetches_only_when_stale() {
        let cache = QueryCache::new();
        let group = GroupId::new();
        let key = QueryKey::dashboard(group);
        let calls = AtomicUsize::new(0);

        let fetch = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(dashboard(group, &["a"]))
        };

        cache.get_or_fetch(key, fetch).await.unwrap();
        cache.get_or_fetch(key, fetch).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert!(cache.invalidate(&key));
        assert!(cache.is_stale(&key));
        cache.get_or_fetch(key, fetch).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(!cache.is_stale(&key));
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_stale_entry() {
        let cache = QueryCache::new();
        let group = GroupId::new();
        let key = QueryKey::dashboard(group);
        cache.insert(key, dashboard(group, &["a"]));
        cache.invalidate(&key);

        let result = cache
            .get_or_fetch(key, || async { Err(AppError::database("offline")) })
            .await;
        assert!(result.is_err());
        assert!(cache.get(&key).is_some());
        assert!(cache.is_stale(&key));
    }

    #[test]
    fn test_scope_operations_are_isolated() {
        let cache = QueryCache::new();
        let (a, b) = (GroupId::new(), GroupId::new());
        cache.insert(QueryKey::dashboard(a), dashboard(a, &["a"]));
        cache.insert(QueryKey::join_requests(a), QueryData::JoinRequests(vec![]));
        cache.insert(QueryKey::dashboard(b), dashboard(b, &["b"]));

        assert_eq!(cache.invalidate_scope(Scope::Group(a)), 2);
        assert!(!cache.is_stale(&QueryKey::dashboard(b)));

        assert_eq!(cache.remove_scope(Scope::Group(a)), 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&QueryKey::dashboard(b)).is_some());
    }
}
