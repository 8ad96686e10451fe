//! Notifications context.

use serde::{Deserialize, Serialize};

use ripple_events::EventKind;

/// Event: NotificationRequested.
///
/// Delivered to `events:user:<target_user_id>` when a target user is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequested {
    pub title: String,
    pub body: String,
    pub link: Option<String>,
    pub channel: String,
}

impl Default for NotificationRequested {
    fn default() -> Self {
        Self {
            title: String::new(),
            body: String::new(),
            link: None,
            channel: "in_app".to_string(),
        }
    }
}

impl EventKind for NotificationRequested {
    const CONTEXT: &'static str = "notifications";
    const EVENT_NAME: &'static str = "notification_requested";
    const AGGREGATE_TYPE: &'static str = "notification";
    const REQUIRED_FIELDS: &'static [&'static str] = &["title"];
    const USER_SCOPED: bool = true;
}
