//! Chat context.

use serde::{Deserialize, Serialize};

use ripple_events::EventKind;

/// Event: MessagePosted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePosted {
    pub channel_id: String,
    pub body: String,
    /// User ids mentioned in the body.
    pub mentions: Vec<String>,
}

impl EventKind for MessagePosted {
    const CONTEXT: &'static str = "chat";
    const EVENT_NAME: &'static str = "message_posted";
    const AGGREGATE_TYPE: &'static str = "message";
    const REQUIRED_FIELDS: &'static [&'static str] = &["channel_id", "body"];
}
