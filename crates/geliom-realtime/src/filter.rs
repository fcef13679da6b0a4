//! Event filter predicates.

use geliom_cache::Scope;
use geliom_core::types::UserId;

use crate::message::ChangeEvent;

/// Whether `event` was caused by `actor` (the row's `user_id`).
///
/// The local client has already applied its own change optimistically, so
/// these events are never applied to its cache.
pub fn is_self_originated(event: &ChangeEvent, actor: UserId) -> bool {
    event.user_id() == Some(actor)
}

/// Whether `event` belongs to `scope`.
///
/// A row without a group is globally visible and concerns every scope. A
/// row with a group only concerns that group's scope.
pub fn is_relevant(event: &ChangeEvent, scope: Scope) -> bool {
    match event.group_id() {
        None => true,
        Some(group) => scope.group_id() == Some(group),
    }
}
