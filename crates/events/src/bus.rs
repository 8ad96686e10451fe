//! The write-side API: publish domain events onto the transport.
//!
//! `emit` runs synchronously in the caller's thread up to the point of handing
//! each topic broadcast to the transport. It never waits for a subscriber to
//! process anything, and it never fails from the caller's perspective:
//! delivery is fire-and-forget, transport trouble is logged and swallowed.
//!
//! ## Usage Pattern
//!
//! ```ignore
//! let bus = EventBus::new(Arc::new(InMemoryPubSub::new()));
//!
//! let created = Event::<ProjectCreated>::new(json!({
//!     "aggregate_id": project.id,
//!     "actor_id": user.id,
//!     "workspace_id": workspace.id,
//!     "name": project.name,
//! }))?;
//!
//! bus.emit(created);
//! ```

use ripple_core::MailboxId;
use tracing::{debug, warn};

use crate::event::SharedEvent;
use crate::topic::{Topic, topics_for};
use crate::transport::{Mailbox, Message, PubSub};

/// Event bus over a [`PubSub`] transport.
///
/// Cheap to clone when the transport is (e.g. `Arc<InMemoryPubSub>`).
#[derive(Debug, Clone, Default)]
pub struct EventBus<T> {
    transport: T,
}

impl<T: PubSub> EventBus<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Broadcast `event`, unmodified, on every topic it routes to.
    pub fn emit(&self, event: impl Into<SharedEvent>) {
        let event: SharedEvent = event.into();
        let topics = topics_for(event.as_ref());

        debug!(
            event_type = %event.event_type(),
            event_id = %event.event_id(),
            topics = topics.len(),
            "emitting domain event"
        );

        for topic in &topics {
            if let Err(err) = self
                .transport
                .broadcast(topic, Message::Event(event.clone()))
            {
                warn!(
                    topic = %topic,
                    event_type = %event.event_type(),
                    event_id = %event.event_id(),
                    error = %err,
                    "event broadcast failed"
                );
            }
        }
    }

    /// Emit each event in order. No atomicity across the batch.
    pub fn emit_all<I>(&self, events: I)
    where
        I: IntoIterator,
        I::Item: Into<SharedEvent>,
    {
        for event in events {
            self.emit(event);
        }
    }

    /// Make `mailbox` a recipient of `topic`.
    pub fn subscribe(&self, topic: &Topic, mailbox: &Mailbox) -> Result<(), T::Error> {
        self.transport.subscribe(topic, mailbox)
    }

    /// Stop delivering `topic` to the mailbox with this id.
    pub fn unsubscribe(&self, topic: &Topic, mailbox: MailboxId) -> Result<(), T::Error> {
        self.transport.unsubscribe(topic, mailbox)
    }
}
