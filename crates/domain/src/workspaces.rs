//! Workspaces context.
//!
//! Membership events are user scoped: the affected user hears about them on
//! their personal topic even before they can see the workspace.

use serde::{Deserialize, Serialize};

use ripple_events::EventKind;

/// Event: WorkspaceCreated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceCreated {
    pub name: String,
    pub slug: String,
}

impl EventKind for WorkspaceCreated {
    const CONTEXT: &'static str = "workspaces";
    const EVENT_NAME: &'static str = "workspace_created";
    const AGGREGATE_TYPE: &'static str = "workspace";
    const REQUIRED_FIELDS: &'static [&'static str] = &["name"];
}

/// Event: MemberInvited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberInvited {
    pub email: String,
    pub role: String,
}

impl Default for MemberInvited {
    fn default() -> Self {
        Self {
            email: String::new(),
            role: "member".to_string(),
        }
    }
}

impl EventKind for MemberInvited {
    const CONTEXT: &'static str = "workspaces";
    const EVENT_NAME: &'static str = "member_invited";
    const AGGREGATE_TYPE: &'static str = "workspace";
    const REQUIRED_FIELDS: &'static [&'static str] = &["email"];
    const USER_SCOPED: bool = true;
}

/// Event: MemberRemoved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRemoved {}

impl EventKind for MemberRemoved {
    const CONTEXT: &'static str = "workspaces";
    const EVENT_NAME: &'static str = "member_removed";
    const AGGREGATE_TYPE: &'static str = "workspace";
    const USER_SCOPED: bool = true;
}
