//! Projects context.

use serde::{Deserialize, Serialize};

use ripple_events::EventKind;

/// Event: ProjectCreated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectCreated {
    pub name: String,
    pub description: Option<String>,
}

impl EventKind for ProjectCreated {
    const CONTEXT: &'static str = "projects";
    const EVENT_NAME: &'static str = "project_created";
    const AGGREGATE_TYPE: &'static str = "project";
    const REQUIRED_FIELDS: &'static [&'static str] = &["name"];
}

/// Event: ProjectArchived.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectArchived {}

impl EventKind for ProjectArchived {
    const CONTEXT: &'static str = "projects";
    const EVENT_NAME: &'static str = "project_archived";
    const AGGREGATE_TYPE: &'static str = "project";
}
