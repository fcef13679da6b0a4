//! Change event definitions.
//!
//! The database publishes one JSON document per row change:
//!
//! ```json
//! {"schema": "public", "table": "user_moods", "type": "UPDATE",
//!  "record": {...}, "old_record": {...}}
//! ```
//!
//! `record` is absent for deletes and `old_record` for inserts.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use geliom_core::error::AppError;
use geliom_core::types::{GroupId, UserId};

/// Kind of row change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// A single row change on a watched table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Insert, update or delete.
    #[serde(rename = "type")]
    pub event_type: ChangeKind,
    /// Schema of the table, normally `public`.
    #[serde(default = "default_schema")]
    pub schema: String,
    /// Table name.
    pub table: String,
    /// Row after the change.
    #[serde(default, rename = "record", skip_serializing_if = "Option::is_none")]
    pub new: Option<Value>,
    /// Row before the change.
    #[serde(default, rename = "old_record", skip_serializing_if = "Option::is_none")]
    pub old: Option<Value>,
}

fn default_schema() -> String {
    "public".to_string()
}

impl ChangeEvent {
    /// Build an insert event.
    pub fn insert(table: impl Into<String>, row: Value) -> Self {
        Self::build(ChangeKind::Insert, table, Some(row), None)
    }

    /// Build an update event.
    pub fn update(table: impl Into<String>, row: Value, old: Option<Value>) -> Self {
        Self::build(ChangeKind::Update, table, Some(row), old)
    }

    /// Build a delete event.
    pub fn delete(table: impl Into<String>, old: Value) -> Self {
        Self::build(ChangeKind::Delete, table, None, Some(old))
    }

    fn build(kind: ChangeKind, table: impl Into<String>, new: Option<Value>, old: Option<Value>) -> Self {
        Self {
            event_type: kind,
            schema: default_schema(),
            table: table.into(),
            new,
            old,
        }
    }

    /// Parse a NOTIFY payload.
    pub fn from_json(payload: &str) -> Result<Self, AppError> {
        Ok(serde_json::from_str(payload)?)
    }

    /// The row this event is about: the old row for deletes, otherwise the
    /// new one.
    pub fn row(&self) -> Option<&Value> {
        match self.event_type {
            ChangeKind::Delete => self.old.as_ref().or(self.new.as_ref()),
            _ => self.new.as_ref().or(self.old.as_ref()),
        }
    }

    /// A single column of [`row`](Self::row), `None` when absent, null or
    /// of the wrong shape.
    pub fn field<T: DeserializeOwned>(&self, column: &str) -> Option<T> {
        let value = self.row()?.get(column)?;
        if value.is_null() {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }

    /// [`row`](Self::row) deserialized into an entity.
    pub fn record<T: DeserializeOwned>(&self) -> Option<T> {
        serde_json::from_value(self.row()?.clone()).ok()
    }

    /// The `user_id` column: the actor for every watched table.
    pub fn user_id(&self) -> Option<UserId> {
        self.field("user_id")
    }

    /// The `group_id` column. `None` marks a globally visible row.
    pub fn group_id(&self) -> Option<GroupId> {
        self.field("group_id")
    }

    pub fn is_delete(&self) -> bool {
        self.event_type == ChangeKind::Delete
    }
}

/// What a change feed delivers to its subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedMessage {
    /// A row change.
    Change(ChangeEvent),
    /// Events may have been missed (listener reconnect); cached state must
    /// be refetched.
    Resync,
}
