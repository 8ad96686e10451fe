//! In-memory pub/sub transport.

use std::collections::HashMap;
use std::sync::Mutex;

use thiserror::Error;

use ripple_core::MailboxId;

use crate::topic::Topic;
use crate::transport::{Mailbox, Message, PubSub};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Internal lock poisoning.
    #[error("pub/sub registry lock poisoned")]
    Poisoned,
}

/// Topic → mailboxes map behind a single lock.
///
/// - No IO / no async
/// - Broadcast happens under the lock, so one publisher's messages keep their
///   order in every mailbox
/// - Mailboxes whose receiver is gone are dropped on the next broadcast
/// - Subscribing the same mailbox to a topic twice is a no-op
#[derive(Debug, Default)]
pub struct InMemoryPubSub {
    topics: Mutex<HashMap<Topic, Vec<Mailbox>>>,
}

impl InMemoryPubSub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live subscriptions on `topic`.
    pub fn subscriber_count(&self, topic: &Topic) -> usize {
        self.topics
            .lock()
            .map(|topics| topics.get(topic).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    /// Topics with at least one subscriber, sorted.
    pub fn active_topics(&self) -> Vec<Topic> {
        let mut active: Vec<Topic> = self
            .topics
            .lock()
            .map(|topics| topics.keys().cloned().collect())
            .unwrap_or_default();
        active.sort();
        active
    }
}

impl PubSub for InMemoryPubSub {
    type Error = TransportError;

    fn subscribe(&self, topic: &Topic, mailbox: &Mailbox) -> Result<(), Self::Error> {
        let mut topics = self.topics.lock().map_err(|_| TransportError::Poisoned)?;

        let subscribers = topics.entry(topic.clone()).or_default();
        if !subscribers.iter().any(|m| m.id() == mailbox.id()) {
            subscribers.push(mailbox.clone());
        }

        Ok(())
    }

    fn unsubscribe(&self, topic: &Topic, mailbox: MailboxId) -> Result<(), Self::Error> {
        let mut topics = self.topics.lock().map_err(|_| TransportError::Poisoned)?;

        if let Some(subscribers) = topics.get_mut(topic) {
            subscribers.retain(|m| m.id() != mailbox);
            if subscribers.is_empty() {
                topics.remove(topic);
            }
        }

        Ok(())
    }

    fn broadcast(&self, topic: &Topic, message: Message) -> Result<(), Self::Error> {
        let mut topics = self.topics.lock().map_err(|_| TransportError::Poisoned)?;

        if let Some(subscribers) = topics.get_mut(topic) {
            // Drop any dead subscribers while broadcasting.
            subscribers.retain(|m| m.send(message.clone()));
            if subscribers.is_empty() {
                topics.remove(topic);
            }
        }

        Ok(())
    }
}
