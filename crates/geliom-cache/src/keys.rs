//! Query cache keys.
//!
//! Every cached query is addressed by the kind of entity it holds and the
//! scope it was fetched for. Scopes never overlap: a group-scoped entry is
//! only ever touched through a key carrying the same group id.

use std::fmt;

use geliom_core::types::GroupId;
use serde::{Deserialize, Serialize};

/// Visibility scope of a query or subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Scope {
    /// Rows belonging to one group.
    Group(GroupId),
    /// Rows visible everywhere (global statuses and moods).
    Global,
}

impl Scope {
    /// Group id of a group scope.
    pub fn group_id(&self) -> Option<GroupId> {
        match self {
            Self::Group(id) => Some(*id),
            Self::Global => None,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Group(id) => write!(f, "group:{id}"),
            Self::Global => write!(f, "global"),
        }
    }
}

/// Entity kind held by a cached query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    /// Group dashboard (members with status, mood and nickname).
    Dashboard,
    /// Pending join requests of a group.
    JoinRequests,
}

impl QueryKind {
    /// Return the kind as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::JoinRequests => "join_requests",
        }
    }
}

/// Composite cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryKey {
    /// Entity kind.
    pub kind: QueryKind,
    /// Scope the query was fetched for.
    pub scope: Scope,
}

impl QueryKey {
    /// Build a key.
    pub fn new(kind: QueryKind, scope: Scope) -> Self {
        Self { kind, scope }
    }

    /// Dashboard of a group.
    pub fn dashboard(group_id: GroupId) -> Self {
        Self::new(QueryKind::Dashboard, Scope::Group(group_id))
    }

    /// Pending join requests of a group.
    pub fn join_requests(group_id: GroupId) -> Self {
        Self::new(QueryKind::JoinRequests, Scope::Group(group_id))
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.as_str(), self.scope)
    }
}
