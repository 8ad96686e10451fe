//! Accounts context.

use serde::{Deserialize, Serialize};

use ripple_events::EventKind;

/// Event: UserRegistered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRegistered {
    pub email: String,
    pub display_name: String,
}

impl EventKind for UserRegistered {
    const CONTEXT: &'static str = "accounts";
    const EVENT_NAME: &'static str = "user_registered";
    const AGGREGATE_TYPE: &'static str = "user";
    const REQUIRED_FIELDS: &'static [&'static str] = &["email"];
}

/// Event: UserDeactivated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDeactivated {
    pub reason: Option<String>,
}

impl EventKind for UserDeactivated {
    const CONTEXT: &'static str = "accounts";
    const EVENT_NAME: &'static str = "user_deactivated";
    const AGGREGATE_TYPE: &'static str = "user";
}
