//! A transport that refuses one topic, for exercising failure paths.

use thiserror::Error;

use ripple_core::MailboxId;

use crate::in_memory_pubsub::{InMemoryPubSub, TransportError};
use crate::topic::Topic;
use crate::transport::{Mailbox, Message, PubSub};

#[derive(Debug, Error)]
pub(crate) enum FaultError {
    #[error("topic `{0}` is unavailable")]
    Unavailable(Topic),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// In-memory pub/sub whose `subscribe` and `broadcast` fail on `broken`.
#[derive(Debug)]
pub(crate) struct BrokenTopicPubSub {
    pub(crate) inner: InMemoryPubSub,
    broken: Topic,
}

impl BrokenTopicPubSub {
    pub(crate) fn new(broken: Topic) -> Self {
        Self {
            inner: InMemoryPubSub::new(),
            broken,
        }
    }

    fn check(&self, topic: &Topic) -> Result<(), FaultError> {
        if *topic == self.broken {
            return Err(FaultError::Unavailable(topic.clone()));
        }
        Ok(())
    }
}

impl PubSub for BrokenTopicPubSub {
    type Error = FaultError;

    fn subscribe(&self, topic: &Topic, mailbox: &Mailbox) -> Result<(), Self::Error> {
        self.check(topic)?;
        Ok(self.inner.subscribe(topic, mailbox)?)
    }

    fn unsubscribe(&self, topic: &Topic, mailbox: MailboxId) -> Result<(), Self::Error> {
        Ok(self.inner.unsubscribe(topic, mailbox)?)
    }

    fn broadcast(&self, topic: &Topic, message: Message) -> Result<(), Self::Error> {
        self.check(topic)?;
        Ok(self.inner.broadcast(topic, message)?)
    }
}
