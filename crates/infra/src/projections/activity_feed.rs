use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use ripple_domain::{
    AgentRunCompleted, DocumentCreated, DocumentDeleted, DocumentUpdated, MemberInvited,
    MemberRemoved, MessagePosted, ProjectArchived, ProjectCreated,
};
use ripple_events::{DomainEvent, Event, EventHandler, EventId, SharedEvent, Topic};

use crate::read_model::WorkspaceStore;

/// One line of a workspace's activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityEntry {
    pub event_id: EventId,
    pub event_type: String,
    pub actor_id: String,
    pub aggregate_id: String,
    pub summary: String,
    pub occurred_at: DateTime<Utc>,
}

impl ActivityEntry {
    pub fn from_event(event: &dyn DomainEvent) -> Self {
        Self {
            event_id: event.event_id(),
            event_type: event.event_type().to_string(),
            actor_id: event.actor_id().to_string(),
            aggregate_id: event.aggregate_id().to_string(),
            summary: summarize(event),
            occurred_at: event.occurred_at(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActivityFeedError {
    #[error("event {event_id} belongs to workspace {found:?}, feed is for `{expected}`")]
    WorkspaceMismatch {
        event_id: EventId,
        expected: String,
        found: Option<String>,
    },
}

/// Activity feed of one workspace.
///
/// Subscribes to the workspace topic and keeps one [`ActivityEntry`] per
/// event. Entries are keyed by event id, so a redelivered event overwrites
/// itself instead of appearing twice.
#[derive(Debug)]
pub struct ActivityFeedProjection<S: ?Sized> {
    workspace_id: String,
    store: Arc<S>,
}

impl<S> ActivityFeedProjection<S>
where
    S: WorkspaceStore<EventId, ActivityEntry> + ?Sized,
{
    pub fn new(workspace_id: impl Into<String>, store: Arc<S>) -> Self {
        Self {
            workspace_id: workspace_id.into(),
            store,
        }
    }

    pub fn workspace_id(&self) -> &str {
        &self.workspace_id
    }

    pub fn apply(&self, event: &dyn DomainEvent) -> Result<(), ActivityFeedError> {
        if event.workspace_id() != Some(self.workspace_id.as_str()) {
            return Err(ActivityFeedError::WorkspaceMismatch {
                event_id: event.event_id(),
                expected: self.workspace_id.clone(),
                found: event.workspace_id().map(str::to_string),
            });
        }

        let entry = ActivityEntry::from_event(event);
        let event_id = entry.event_id;
        if self.store.upsert(&self.workspace_id, event_id, entry).is_some() {
            debug!(workspace_id = %self.workspace_id, event_id = %event_id, "activity redelivered; entry replaced");
        } else {
            debug!(workspace_id = %self.workspace_id, event_id = %event_id, "activity recorded");
        }
        Ok(())
    }

    /// The feed, oldest first.
    pub fn feed(&self) -> Vec<ActivityEntry> {
        activity_feed(&*self.store, &self.workspace_id)
    }
}

impl<S> EventHandler for ActivityFeedProjection<S>
where
    S: WorkspaceStore<EventId, ActivityEntry> + ?Sized + 'static,
{
    fn name(&self) -> &str {
        "activity_feed"
    }

    fn subscriptions(&self) -> Vec<Topic> {
        vec![Topic::workspace(&self.workspace_id)]
    }

    fn handle_event(&mut self, event: &SharedEvent) -> anyhow::Result<()> {
        self.apply(event.as_ref())?;
        Ok(())
    }
}

/// A workspace's feed read straight from the store, oldest first.
pub fn activity_feed<S>(store: &S, workspace_id: &str) -> Vec<ActivityEntry>
where
    S: WorkspaceStore<EventId, ActivityEntry> + ?Sized,
{
    let mut entries = store.list(workspace_id);
    entries.sort_by_key(|e| (e.occurred_at, e.event_id));
    entries
}

fn summarize(event: &dyn DomainEvent) -> String {
    if let Some(e) = event.downcast_ref::<Event<DocumentCreated>>() {
        return format!("created document \"{}\"", e.payload().title);
    }
    if let Some(e) = event.downcast_ref::<Event<DocumentUpdated>>() {
        return format!("updated document \"{}\" (rev {})", e.payload().title, e.payload().revision);
    }
    if event.is::<Event<DocumentDeleted>>() {
        return format!("deleted document {}", event.aggregate_id());
    }
    if let Some(e) = event.downcast_ref::<Event<MessagePosted>>() {
        return format!("posted in #{}", e.payload().channel_id);
    }
    if let Some(e) = event.downcast_ref::<Event<MemberInvited>>() {
        return format!("invited {} as {}", e.payload().email, e.payload().role);
    }
    if event.is::<Event<MemberRemoved>>() {
        return "removed a member".to_string();
    }
    if let Some(e) = event.downcast_ref::<Event<ProjectCreated>>() {
        return format!("created project \"{}\"", e.payload().name);
    }
    if event.is::<Event<ProjectArchived>>() {
        return format!("archived project {}", event.aggregate_id());
    }
    if let Some(e) = event.downcast_ref::<Event<AgentRunCompleted>>() {
        return format!("agent run {} {}", e.payload().run_id, e.payload().status);
    }

    format!("{} on {} {}", event.event_type(), event.aggregate_type(), event.aggregate_id())
}
