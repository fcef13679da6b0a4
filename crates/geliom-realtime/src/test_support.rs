use std::time::Duration;

use async_trait::async_trait;
use geliom_cache::QueryData;
use geliom_core::result::AppResult;
use geliom_core::types::{GroupId, MoodId, StatusId, UserId};
use geliom_database::store::LookupSource;
use geliom_entity::group::{DashboardData, DashboardMember, GroupSummary};
use geliom_entity::presence::{Mood, Status};
use geliom_entity::profile::Profile;

pub(crate) struct NoLookups;

#[async_trait]
impl LookupSource for NoLookups {
    async fn status(&self, _id: StatusId) -> AppResult<Option<Status>> {
        Ok(None)
    }

    async fn mood(&self, _id: MoodId) -> AppResult<Option<Mood>> {
        Ok(None)
    }

    async fn profile(&self, _id: UserId) -> AppResult<Option<Profile>> {
        Ok(None)
    }
}

pub(crate) fn dashboard(group: GroupId, members: &[UserId]) -> QueryData {
    QueryData::Dashboard(DashboardData {
        group: GroupSummary {
            id: group,
            name: "Aile".into(),
            owner_id: members[0],
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
    })
}

/// Poll `check` until it holds or a second has passed.
pub(crate) async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    false
}
