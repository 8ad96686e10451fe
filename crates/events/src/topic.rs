//! Topic names and the router that fans an event out across them.
//!
//! Every event reaches, in order:
//!
//! 1. `events:<context>`
//! 2. `events:<context>:<aggregate_type>`
//! 3. `events:workspace:<workspace_id>` (only with a non-empty workspace id)
//! 4. `events:user:<target_user_id>` (only with a non-empty target user)
//!
//! Subscribers pick their granularity; publishers never know who listens.

use std::fmt;

use crate::event::DomainEvent;

const PREFIX: &str = "events";

/// A named broadcast channel on the transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Topic(String);

impl Topic {
    /// An arbitrary topic name. Prefer the typed constructors below.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// All events of a business context.
    pub fn context(context: &str) -> Self {
        Self(format!("{PREFIX}:{context}"))
    }

    /// All events about one aggregate type within a context.
    pub fn aggregate(context: &str, aggregate_type: &str) -> Self {
        Self(format!("{PREFIX}:{context}:{aggregate_type}"))
    }

    /// All events scoped to one workspace.
    pub fn workspace(workspace_id: &str) -> Self {
        Self(format!("{PREFIX}:workspace:{workspace_id}"))
    }

    /// Events addressed to one user.
    pub fn user(user_id: &str) -> Self {
        Self(format!("{PREFIX}:user:{user_id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Topic {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Every topic `event` must be delivered on.
///
/// Pure and deterministic. An absent or empty identifier excludes its topic;
/// it is never published with an empty suffix.
pub fn topics_for<E>(event: &E) -> Vec<Topic>
where
    E: DomainEvent + ?Sized,
{
    let event_type = event.event_type();
    let context = event_type.context();

    let mut topics = vec![
        Topic::context(context),
        Topic::aggregate(context, event.aggregate_type()),
    ];

    if let Some(workspace_id) = non_empty(event.workspace_id()) {
        topics.push(Topic::workspace(workspace_id));
    }

    if let Some(user_id) = non_empty(event.target_user_id()) {
        topics.push(Topic::user(user_id));
    }

    topics
}

fn non_empty(id: Option<&str>) -> Option<&str> {
    id.filter(|id| !id.is_empty())
}
