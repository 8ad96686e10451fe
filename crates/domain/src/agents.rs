//! Agents context.

use serde::{Deserialize, Serialize};

use ripple_events::EventKind;

/// Event: AgentCreated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentCreated {
    pub name: String,
    pub model: Option<String>,
}

impl EventKind for AgentCreated {
    const CONTEXT: &'static str = "agents";
    const EVENT_NAME: &'static str = "agent_created";
    const AGGREGATE_TYPE: &'static str = "agent";
    const REQUIRED_FIELDS: &'static [&'static str] = &["name"];
}

/// Event: AgentRunCompleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRunCompleted {
    pub run_id: String,
    pub status: String,
    pub duration_ms: u64,
}

impl Default for AgentRunCompleted {
    fn default() -> Self {
        Self {
            run_id: String::new(),
            status: "succeeded".to_string(),
            duration_ms: 0,
        }
    }
}

impl EventKind for AgentRunCompleted {
    const CONTEXT: &'static str = "agents";
    const EVENT_NAME: &'static str = "agent_run_completed";
    const AGGREGATE_TYPE: &'static str = "agent";
    const REQUIRED_FIELDS: &'static [&'static str] = &["run_id"];
}
