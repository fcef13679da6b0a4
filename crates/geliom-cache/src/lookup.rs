//! Memoised point lookups.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;

use geliom_core::config::CacheConfig;
use geliom_core::result::AppResult;
use geliom_core::types::{MoodId, StatusId, UserId};
use geliom_database::store::LookupSource;
use geliom_entity::presence::{Mood, Status};
use geliom_entity::profile::Profile;

/// [`LookupSource`] decorator that remembers found rows for a while.
///
/// Misses are not memoised so a row created after the first lookup becomes
/// visible on the next one.
#[derive(Clone)]
pub struct MemoizedLookup {
    inner: Arc<dyn LookupSource>,
    statuses: Cache<StatusId, Status>,
    moods: Cache<MoodId, Mood>,
    profiles: Cache<UserId, Profile>,
}

impl std::fmt::Debug for MemoizedLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoizedLookup")
            .field("statuses", &self.statuses.entry_count())
            .field("moods", &self.moods.entry_count())
            .field("profiles", &self.profiles.entry_count())
            .finish()
    }
}

impl MemoizedLookup {
    /// Wrap `inner` using the configured capacity and TTL.
    pub fn new(inner: Arc<dyn LookupSource>, config: &CacheConfig) -> Self {
        let ttl = Duration::from_secs(config.lookup_ttl_seconds);
        Self {
            inner,
            statuses: Cache::builder()
                .max_capacity(config.lookup_capacity)
                .time_to_live(ttl)
                .build(),
            moods: Cache::builder()
                .max_capacity(config.lookup_capacity)
                .time_to_live(ttl)
                .build(),
            profiles: Cache::builder()
                .max_capacity(config.lookup_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }
}

#[async_trait]
impl LookupSource for MemoizedLookup {
    async fn status(&self, id: StatusId) -> AppResult<Option<Status>> {
        if let Some(hit) = self.statuses.get(&id).await {
            return Ok(Some(hit));
        }
        let found = self.inner.status(id).await?;
        if let Some(status) = &found {
            self.statuses.insert(id, status.clone()).await;
        }
        Ok(found)
    }

    async fn mood(&self, id: MoodId) -> AppResult<Option<Mood>> {
        if let Some(hit) = self.moods.get(&id).await {
            return Ok(Some(hit));
        }
        let found = self.inner.mood(id).await?;
        if let Some(mood) = &found {
            self.moods.insert(id, mood.clone()).await;
        }
        Ok(found)
    }

    async fn profile(&self, id: UserId) -> AppResult<Option<Profile>> {
        if let Some(hit) = self.profiles.get(&id).await {
            return Ok(Some(hit));
        }
        let found = self.inner.profile(id).await?;
        if let Some(profile) = &found {
            self.profiles.insert(id, profile.clone()).await;
        }
        Ok(found)
    }
}
