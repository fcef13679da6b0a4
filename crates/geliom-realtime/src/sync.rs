//! Applying change events to the query cache.
//!
//! Every event goes through the same steps:
//!
//! 1. Drop it unless it is relevant to the subscription's scope.
//! 2. Drop it if the local user caused it.
//! 3. Patch the affected cached entry in place when the table has a patch
//!    rule, looking up related entities that are not already embedded.
//! 4. Otherwise, or when a patch cannot be applied, mark the scope's
//!    cached queries stale so the next read refetches them.
//!
//! Cache keys are always derived from the subscription scope and never
//! from the event, so an event can only ever touch entries of the scope it
//! was delivered to.

use std::fmt::Display;
use std::sync::Arc;

use tracing::{debug, warn};

use geliom_cache::{QueryCache, QueryData, QueryKey, Scope};
use geliom_core::result::AppResult;
use geliom_core::types::{GroupId, JoinRequestId, MoodId, StatusId, UserId};
use geliom_database::store::LookupSource;
use geliom_entity::group::{
    DashboardMember, JoinRequest, JoinRequestStatus, JoinRequestView, MemberMood, MemberStatus,
};
use geliom_entity::presence::{UserMood, UserStatus};

use crate::channel::tables;
use crate::filter::{is_relevant, is_self_originated};
use crate::message::ChangeEvent;

/// Why an event was dropped without touching the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The row belongs to another scope.
    OutOfScope,
    /// The local user made the change.
    SelfOriginated,
}

/// Effect of one event on the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    /// Dropped before reaching the cache.
    Ignored(IgnoreReason),
    /// A cached entry was modified in place.
    Patched(QueryKey),
    /// Nothing cached was affected.
    Unaffected,
    /// The scope's entries were marked stale.
    Invalidated { scope: Scope, entries: usize },
}

/// Applies change events to one user's query cache.
pub struct CacheSynchronizer {
    viewer: UserId,
    cache: Arc<QueryCache>,
    lookups: Arc<dyn LookupSource>,
}

impl std::fmt::Debug for CacheSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheSynchronizer")
            .field("viewer", &self.viewer)
            .field("cached_queries", &self.cache.len())
            .finish_non_exhaustive()
    }
}

impl CacheSynchronizer {
    /// Creates a synchronizer for `viewer`, the locally authenticated user.
    pub fn new(viewer: UserId, cache: Arc<QueryCache>, lookups: Arc<dyn LookupSource>) -> Self {
        Self {
            viewer,
            cache,
            lookups,
        }
    }

    pub fn viewer(&self) -> UserId {
        self.viewer
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    /// Apply `event`, delivered on a channel of `scope`.
    pub async fn apply(&self, event: &ChangeEvent, scope: Scope) -> SyncAction {
        if !is_relevant(event, scope) {
            return SyncAction::Ignored(IgnoreReason::OutOfScope);
        }
        if is_self_originated(event, self.viewer) {
            return SyncAction::Ignored(IgnoreReason::SelfOriginated);
        }
        let Some(group) = scope.group_id() else {
            return self.invalidate(scope);
        };

        let patched = match event.table.as_str() {
            tables::USER_STATUSES => self.patch_status(event, group).await,
            tables::USER_MOODS => self.patch_mood(event, group).await,
            tables::NICKNAMES => self.patch_nickname(event, group),
            tables::JOIN_REQUESTS => self.patch_join_request(event, group).await,
            _ => None,
        };

        let action = patched.unwrap_or_else(|| self.invalidate(scope));
        debug!(
            table = %event.table,
            kind = ?event.event_type,
            scope = %scope,
            action = ?action,
            "Applied change event"
        );
        action
    }

    /// Mark every cached query of `scope` stale.
    pub fn invalidate(&self, scope: Scope) -> SyncAction {
        let entries = self.cache.invalidate_scope(scope);
        SyncAction::Invalidated { scope, entries }
    }

    async fn patch_status(&self, event: &ChangeEvent, group: GroupId) -> Option<SyncAction> {
        let key = QueryKey::dashboard(group);
        if !self.cache.contains(&key) {
            return Some(SyncAction::Unaffected);
        }
        let user = event.user_id()?;
        if self.is_global_stranger(event, &key, user) {
            return Some(SyncAction::Unaffected);
        }
        if event.is_delete() {
            return self.patch_member(&key, user, |m| m.status = None);
        }

        let row: UserStatus = event.record()?;
        let status = match (row.status, self.embedded_status(&key, user, row.status_id)) {
            (Some(status), _) => MemberStatus::from_status(&status, row.updated_at),
            (None, Some(mut current)) => {
                current.updated_at = row.updated_at;
                current
            }
            (None, None) => {
                let status = settle("status", row.status_id, self.lookups.status(row.status_id).await)?;
                MemberStatus::from_status(&status, row.updated_at)
            }
        };
        self.patch_member(&key, user, move |m| m.status = Some(status))
    }

    async fn patch_mood(&self, event: &ChangeEvent, group: GroupId) -> Option<SyncAction> {
        let key = QueryKey::dashboard(group);
        if !self.cache.contains(&key) {
            return Some(SyncAction::Unaffected);
        }
        let user = event.user_id()?;
        if self.is_global_stranger(event, &key, user) {
            return Some(SyncAction::Unaffected);
        }
        if event.is_delete() {
            return self.patch_member(&key, user, |m| m.mood = None);
        }

        let row: UserMood = event.record()?;
        let mood = match (row.mood, self.embedded_mood(&key, user, row.mood_id)) {
            (Some(mood), _) => MemberMood::from_mood(&mood, row.updated_at),
            (None, Some(mut current)) => {
                current.updated_at = row.updated_at;
                current
            }
            (None, None) => {
                let mood = settle("mood", row.mood_id, self.lookups.mood(row.mood_id).await)?;
                MemberMood::from_mood(&mood, row.updated_at)
            }
        };
        self.patch_member(&key, user, move |m| m.mood = Some(mood))
    }

    fn patch_nickname(&self, event: &ChangeEvent, group: GroupId) -> Option<SyncAction> {
        let key = QueryKey::dashboard(group);
        if !self.cache.contains(&key) {
            return Some(SyncAction::Unaffected);
        }
        let user = event.user_id()?;
        if self.is_global_stranger(event, &key, user) {
            return Some(SyncAction::Unaffected);
        }
        let nickname = if event.is_delete() {
            None
        } else {
            Some(event.field::<String>("nickname")?)
        };
        self.patch_member(&key, user, move |m| m.nickname = nickname)
    }

    async fn patch_join_request(&self, event: &ChangeEvent, group: GroupId) -> Option<SyncAction> {
        let key = QueryKey::join_requests(group);
        if !self.cache.contains(&key) {
            return Some(SyncAction::Unaffected);
        }
        let id: JoinRequestId = event.field("id")?;
        let pending = !event.is_delete()
            && event.field::<JoinRequestStatus>("status")? == JoinRequestStatus::Pending;

        if !pending {
            let removed = self.cache.patch(&key, |data| match data {
                QueryData::JoinRequests(list) => {
                    let before = list.len();
                    list.retain(|r| r.id != id);
                    list.len() != before
                }
                _ => false,
            });
            return Some(if removed {
                SyncAction::Patched(key)
            } else {
                SyncAction::Unaffected
            });
        }

        let listed = self
            .cache
            .read(&key, |data| {
                data.as_join_requests()
                    .is_some_and(|list| list.iter().any(|r| r.id == id))
            })
            .unwrap_or(false);
        if listed {
            return Some(SyncAction::Unaffected);
        }

        let row: JoinRequest = event.record()?;
        let requester = settle("profile", row.user_id, self.lookups.profile(row.user_id).await)?;
        let view = JoinRequestView {
            id: row.id,
            group_id: row.group_id,
            requester,
            created_at: row.created_at,
        };
        let inserted = self.cache.patch(&key, move |data| match data {
            QueryData::JoinRequests(list) if !list.iter().any(|r| r.id == view.id) => {
                list.push(view);
                true
            }
            _ => false,
        });
        Some(if inserted {
            SyncAction::Patched(key)
        } else {
            SyncAction::Unaffected
        })
    }

    /// A global row about someone the cached dashboard does not list. The
    /// feed carries such rows for every user on the platform.
    fn is_global_stranger(&self, event: &ChangeEvent, key: &QueryKey, user: UserId) -> bool {
        if event.group_id().is_some() {
            return false;
        }
        let listed = self
            .cache
            .read(key, |data| {
                data.as_dashboard()
                    .is_some_and(|dashboard| dashboard.member(user).is_some())
            })
            .unwrap_or(false);
        !listed
    }

    /// Patch one dashboard member. `None` when the member is not listed,
    /// which means the cached member list itself is out of date.
    fn patch_member<F>(&self, key: &QueryKey, user: UserId, f: F) -> Option<SyncAction>
    where
        F: FnOnce(&mut DashboardMember),
    {
        let patched = self.cache.patch(key, |data| match data {
            QueryData::Dashboard(dashboard) => match dashboard.member_mut(user) {
                Some(member) => {
                    f(member);
                    true
                }
                None => false,
            },
            _ => false,
        });
        patched.then_some(SyncAction::Patched(*key))
    }

    fn embedded_status(&self, key: &QueryKey, user: UserId, id: StatusId) -> Option<MemberStatus> {
        self.cache
            .read(key, |data| {
                data.as_dashboard()?
                    .member(user)?
                    .status
                    .clone()
                    .filter(|s| s.status_id == id)
            })
            .flatten()
    }

    fn embedded_mood(&self, key: &QueryKey, user: UserId, id: MoodId) -> Option<MemberMood> {
        self.cache
            .read(key, |data| {
                data.as_dashboard()?
                    .member(user)?
                    .mood
                    .clone()
                    .filter(|m| m.mood_id == id)
            })
            .flatten()
    }
}

fn settle<T>(what: &'static str, id: impl Display, found: AppResult<Option<T>>) -> Option<T> {
    match found {
        Ok(Some(value)) => Some(value),
        Ok(None) => {
            warn!(entity = what, id = %id, "Referenced entity not found");
            None
        }
        Err(e) => {
            warn!(entity = what, id = %id, error = %e, "Point lookup failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::Utc;
    use geliom_core::error::AppError;
    use geliom_entity::group::{DashboardData, GroupSummary};
    use geliom_entity::presence::{Mood, Status};
    use geliom_entity::profile::Profile;
    use serde_json::json;

    use super::*;

    #[derive(Default)]
    struct Catalogue {
        calls: AtomicUsize,
        profiles_down: bool,
    }

    #[async_trait]
    impl LookupSource for Catalogue {
        async fn status(&self, id: StatusId) -> AppResult<Option<Status>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(Status {
                id,
                text: "Kodluyor".into(),
                emoji: Some("💻".into()),
                notifies: false,
                messages: None,
            }))
        }

        async fn mood(&self, id: MoodId) -> AppResult<Option<Mood>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(Mood {
                id,
                text: "Mutlu".into(),
                emoji: Some("😊".into()),
            }))
        }

        async fn profile(&self, id: UserId) -> AppResult<Option<Profile>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.profiles_down {
                return Err(AppError::database("unreachable"));
            }
            Ok(Some(Profile {
                id,
                display_name: Some("Can".into()),
                avatar_url: None,
            }))
        }
    }

    struct Fixture {
        me: UserId,
        members: Vec<UserId>,
        cache: Arc<QueryCache>,
        lookups: Arc<Catalogue>,
        sync: CacheSynchronizer,
    }

    fn fixture(groups: &[GroupId]) -> Fixture {
        fixture_with(groups, Catalogue::default())
    }

    fn fixture_with(groups: &[GroupId], catalogue: Catalogue) -> Fixture {
        let me = UserId::new();
        let members = vec![me, UserId::new(), UserId::new()];
        let cache = Arc::new(QueryCache::new());
        for group in groups {
            cache.insert(
                QueryKey::dashboard(*group),
                QueryData::Dashboard(DashboardData {
                    group: GroupSummary {
                        id: *group,
                        name: "Aile".into(),
                        owner_id: me,
                        invite_code: None,
                    },
                    members: members
                        .iter()
                        .map(|id| DashboardMember {
                            user_id: *id,
                            display_name: None,
                            avatar_url: None,
                            nickname: None,
                            status: None,
                            mood: None,
                        })
                        .collect(),
                }),
            );
            cache.insert(QueryKey::join_requests(*group), QueryData::JoinRequests(vec![]));
        }
        let lookups = Arc::new(catalogue);
        let sync = CacheSynchronizer::new(me, cache.clone(), lookups.clone());
        Fixture {
            me,
            members,
            cache,
            lookups,
            sync,
        }
    }

    fn dashboard(cache: &QueryCache, group: GroupId) -> DashboardData {
        cache
            .get(&QueryKey::dashboard(group))
            .and_then(|d| d.as_dashboard().cloned())
            .unwrap()
    }

    #[tokio::test]
    async fn test_self_originated_event_never_mutates_cache() {
        let group = GroupId::new();
        let f = fixture(&[group]);
        let before = dashboard(&f.cache, group);

        let event = ChangeEvent::update(
            tables::NICKNAMES,
            json!({ "user_id": f.me, "group_id": group, "nickname": "Ben" }),
            None,
        );
        let action = f.sync.apply(&event, Scope::Group(group)).await;

        assert_eq!(action, SyncAction::Ignored(IgnoreReason::SelfOriginated));
        assert_eq!(dashboard(&f.cache, group), before);
    }

    #[tokio::test]
    async fn test_event_for_group_a_never_touches_group_b() {
        let a = GroupId::new();
        let b = GroupId::new();
        let f = fixture(&[a, b]);
        let other = f.members[1];
        let event = ChangeEvent::update(
            tables::NICKNAMES,
            json!({ "user_id": other, "group_id": a, "nickname": "Abi" }),
            None,
        );

        let on_b = f.sync.apply(&event, Scope::Group(b)).await;
        let on_a = f.sync.apply(&event, Scope::Group(a)).await;

        assert_eq!(on_b, SyncAction::Ignored(IgnoreReason::OutOfScope));
        assert_eq!(on_a, SyncAction::Patched(QueryKey::dashboard(a)));
        assert_eq!(
            dashboard(&f.cache, a).member(other).unwrap().nickname.as_deref(),
            Some("Abi")
        );
        assert_eq!(dashboard(&f.cache, b).member(other).unwrap().nickname, None);
    }

    #[tokio::test]
    async fn test_mood_change_looks_up_mood_and_keeps_order() {
        let group = GroupId::new();
        let f = fixture(&[group]);
        let other = f.members[2];
        let event = ChangeEvent::update(
            tables::USER_MOODS,
            json!({ "user_id": other, "group_id": null, "mood_id": MoodId::new() }),
            None,
        );

        let action = f.sync.apply(&event, Scope::Group(group)).await;

        assert_eq!(action, SyncAction::Patched(QueryKey::dashboard(group)));
        assert_eq!(f.lookups.calls.load(Ordering::SeqCst), 1);
        let data = dashboard(&f.cache, group);
        let order: Vec<_> = data.members.iter().map(|m| m.user_id).collect();
        assert_eq!(order, f.members);
        assert_eq!(data.members[2].mood.as_ref().unwrap().text, "Mutlu");
    }

    #[tokio::test]
    async fn test_global_mood_of_non_member_is_unaffected() {
        let group = GroupId::new();
        let f = fixture(&[group]);
        let event = ChangeEvent::update(
            tables::USER_MOODS,
            json!({ "user_id": UserId::new(), "group_id": null, "mood_id": MoodId::new() }),
            None,
        );

        let action = f.sync.apply(&event, Scope::Group(group)).await;

        assert_eq!(action, SyncAction::Unaffected);
        assert_eq!(f.lookups.calls.load(Ordering::SeqCst), 0);
        assert!(!f.cache.is_stale(&QueryKey::dashboard(group)));
        assert!(!f.cache.is_stale(&QueryKey::join_requests(group)));
    }

    #[tokio::test]
    async fn test_scoped_row_for_unlisted_member_marks_scope_stale() {
        let group = GroupId::new();
        let f = fixture(&[group]);
        let event = ChangeEvent::update(
            tables::NICKNAMES,
            json!({ "user_id": UserId::new(), "group_id": group, "nickname": "Yeni" }),
            None,
        );

        let action = f.sync.apply(&event, Scope::Group(group)).await;

        assert_eq!(
            action,
            SyncAction::Invalidated {
                scope: Scope::Group(group),
                entries: 2
            }
        );
    }

    #[tokio::test]
    async fn test_embedded_status_skips_lookup() {
        let group = GroupId::new();
        let f = fixture(&[group]);
        let other = f.members[1];
        let status_id = StatusId::new();
        let row = json!({ "user_id": other, "group_id": group, "status_id": status_id });

        f.sync
            .apply(&ChangeEvent::insert(tables::USER_STATUSES, row.clone()), Scope::Group(group))
            .await;
        let now = Utc::now();
        let mut touched = row;
        touched["updated_at"] = json!(now);
        f.sync
            .apply(&ChangeEvent::update(tables::USER_STATUSES, touched, None), Scope::Group(group))
            .await;

        assert_eq!(f.lookups.calls.load(Ordering::SeqCst), 1);
        let status = dashboard(&f.cache, group).member(other).unwrap().status.clone().unwrap();
        assert_eq!(status.status_id, status_id);
        assert_eq!(status.updated_at, Some(now));
    }

    #[tokio::test]
    async fn test_nickname_delete_clears_it() {
        let group = GroupId::new();
        let f = fixture(&[group]);
        let other = f.members[1];
        let row = json!({ "user_id": other, "group_id": group, "nickname": "Abi" });

        f.sync
            .apply(&ChangeEvent::insert(tables::NICKNAMES, row.clone()), Scope::Group(group))
            .await;
        f.sync
            .apply(&ChangeEvent::delete(tables::NICKNAMES, row), Scope::Group(group))
            .await;

        assert_eq!(dashboard(&f.cache, group).member(other).unwrap().nickname, None);
    }

    #[tokio::test]
    async fn test_join_request_inserted_then_removed_on_approval() {
        let group = GroupId::new();
        let f = fixture(&[group]);
        let key = QueryKey::join_requests(group);
        let requester = UserId::new();
        let request_id = JoinRequestId::new();
        let row = json!({
            "id": request_id,
            "group_id": group,
            "user_id": requester,
            "status": "pending",
            "created_at": Utc::now(),
        });

        let inserted = f
            .sync
            .apply(&ChangeEvent::insert(tables::JOIN_REQUESTS, row.clone()), Scope::Group(group))
            .await;
        assert_eq!(inserted, SyncAction::Patched(key));
        let list = f.cache.get(&key).unwrap();
        assert_eq!(list.as_join_requests().unwrap()[0].requester.id, requester);

        let mut approved = row;
        approved["status"] = json!("approved");
        let removed = f
            .sync
            .apply(&ChangeEvent::update(tables::JOIN_REQUESTS, approved, None), Scope::Group(group))
            .await;
        assert_eq!(removed, SyncAction::Patched(key));
        assert!(f.cache.get(&key).unwrap().as_join_requests().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_lookup_falls_back_to_invalidate() {
        let group = GroupId::new();
        let f = fixture_with(
            &[group],
            Catalogue {
                profiles_down: true,
                ..Catalogue::default()
            },
        );
        let row = json!({
            "id": JoinRequestId::new(),
            "group_id": group,
            "user_id": UserId::new(),
            "status": "pending",
            "created_at": Utc::now(),
        });

        let action = f
            .sync
            .apply(&ChangeEvent::insert(tables::JOIN_REQUESTS, row), Scope::Group(group))
            .await;

        assert_eq!(
            action,
            SyncAction::Invalidated {
                scope: Scope::Group(group),
                entries: 2
            }
        );
        assert!(f.cache.is_stale(&QueryKey::join_requests(group)));
    }

    #[tokio::test]
    async fn test_unknown_member_marks_dashboard_stale() {
        let group = GroupId::new();
        let f = fixture(&[group]);
        let event = ChangeEvent::update(
            tables::NICKNAMES,
            json!({ "user_id": UserId::new(), "group_id": group, "nickname": "Yeni" }),
            None,
        );

        let action = f.sync.apply(&event, Scope::Group(group)).await;

        assert!(matches!(action, SyncAction::Invalidated { .. }));
        assert!(f.cache.is_stale(&QueryKey::dashboard(group)));
    }

    #[tokio::test]
    async fn test_table_without_rule_marks_scope_stale() {
        let a = GroupId::new();
        let b = GroupId::new();
        let f = fixture(&[a, b]);
        let event = ChangeEvent::insert(
            tables::GROUP_MEMBERS,
            json!({ "user_id": UserId::new(), "group_id": a }),
        );

        let action = f.sync.apply(&event, Scope::Group(a)).await;

        assert!(matches!(action, SyncAction::Invalidated { entries: 2, .. }));
        assert!(f.cache.is_stale(&QueryKey::dashboard(a)));
        assert!(!f.cache.is_stale(&QueryKey::dashboard(b)));
    }

    #[tokio::test]
    async fn test_uncached_scope_skips_lookups() {
        let cached = GroupId::new();
        let uncached = GroupId::new();
        let f = fixture(&[cached]);
        let event = ChangeEvent::update(
            tables::USER_MOODS,
            json!({ "user_id": f.members[1], "group_id": uncached, "mood_id": MoodId::new() }),
            None,
        );

        let action = f.sync.apply(&event, Scope::Group(uncached)).await;

        assert_eq!(action, SyncAction::Unaffected);
        assert_eq!(f.lookups.calls.load(Ordering::SeqCst), 0);
        assert!(!f.cache.contains(&QueryKey::dashboard(uncached)));
    }
}
