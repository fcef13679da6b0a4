//! Channel naming and parsing.

use std::fmt;

use serde::{Deserialize, Serialize};

use geliom_cache::Scope;
use geliom_core::types::GroupId;

/// One logical channel: a watched table seen through one scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelSpec {
    /// Table name.
    pub table: String,
    /// Scope the subscriber owns.
    pub scope: Scope,
}

impl ChannelSpec {
    /// Creates a channel spec.
    pub fn new(table: impl Into<String>, scope: Scope) -> Self {
        Self {
            table: table.into(),
            scope,
        }
    }

    /// Channel for `table` scoped to one group.
    pub fn group(table: impl Into<String>, group_id: GroupId) -> Self {
        Self::new(table, Scope::Group(group_id))
    }

    /// Channel for `table` with global visibility.
    pub fn global(table: impl Into<String>) -> Self {
        Self::new(table, Scope::Global)
    }

    /// Channel name, `"{table}:{scope}"`.
    pub fn name(&self) -> String {
        format!("{}:{}", self.table, self.scope)
    }

    /// Parses a channel name produced by [`name`](Self::name).
    pub fn parse(name: &str) -> Option<Self> {
        let (table, scope) = name.split_once(':')?;
        if table.is_empty() {
            return None;
        }
        let scope = match scope.split_once(':') {
            Some(("group", id)) => Scope::Group(id.parse().ok()?),
            None if scope == "global" => Scope::Global,
            _ => return None,
        };
        Some(Self::new(table, scope))
    }
}

impl fmt::Display for ChannelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.table, self.scope)
    }
}
