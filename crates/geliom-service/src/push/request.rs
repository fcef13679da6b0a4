//! OneSignal notification request body.

use std::collections::BTreeMap;

use serde::Serialize;

use geliom_core::types::{GroupId, UserId};

use super::PushMessage;

/// Body of `POST /notifications`.
///
/// Recipients are addressed through `include_aliases` under the configured
/// alias label, never by device or subscription id.
#[derive(Debug, Clone, Serialize)]
pub struct CreateNotification<'a> {
    pub app_id: &'a str,
    pub include_aliases: BTreeMap<&'a str, Vec<String>>,
    pub target_channel: &'static str,
    pub headings: LocalizedText<'a>,
    pub contents: LocalizedText<'a>,
    pub data: RoutingData<'a>,
}

/// Text keyed by language. Only English is sent; devices fall back to it.
#[derive(Debug, Clone, Serialize)]
pub struct LocalizedText<'a> {
    pub en: &'a str,
}

/// Metadata the mobile client routes on when the push is opened.
#[derive(Debug, Clone, Serialize)]
pub struct RoutingData<'a> {
    #[serde(rename = "type")]
    pub notification_type: &'static str,
    pub group_id: GroupId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<UserId>,
    pub title: &'a str,
}

impl<'a> CreateNotification<'a> {
    /// Build the body for `message`.
    pub fn new(app_id: &'a str, alias_label: &'a str, message: &'a PushMessage) -> Self {
        let aliases = message.recipients.iter().map(UserId::to_string).collect();
        Self {
            app_id,
            include_aliases: BTreeMap::from([(alias_label, aliases)]),
            target_channel: "push",
            headings: LocalizedText {
                en: &message.group_name,
            },
            contents: LocalizedText {
                en: &message.message,
            },
            data: RoutingData {
                notification_type: message.notification_type.as_str(),
                group_id: message.group_id,
                sender_id: message.sender_id,
                title: &message.title,
            },
        }
    }
}
