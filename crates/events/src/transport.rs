//! Publish/subscribe transport contract.
//!
//! The transport is the only shared mutable state in the system: a map from
//! topic to the mailboxes currently subscribed to it. The bus and handler
//! runtime reach it only through [`PubSub`].
//!
//! ## Delivery
//!
//! - **At-most-once, in-process**: a broadcast lands in each subscribed
//!   mailbox once; nothing is persisted or retried.
//! - **Per-sender FIFO**: messages from one publisher arrive in the order the
//!   broadcasts were issued. No ordering across concurrent publishers.
//! - **Empty topics are fine**: broadcasting to a topic nobody listens on is a
//!   silent no-op.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvError, RecvTimeoutError, Sender, TryRecvError};
use std::time::Duration;

use ripple_core::MailboxId;

use crate::event::SharedEvent;
use crate::topic::Topic;

/// Anything that can land in a mailbox.
///
/// Mailboxes are shared with unrelated traffic; receivers must ignore what
/// they do not understand.
#[derive(Debug, Clone)]
pub enum Message {
    Event(SharedEvent),
    Other(String),
}

impl Message {
    pub fn as_event(&self) -> Option<&SharedEvent> {
        match self {
            Message::Event(event) => Some(event),
            Message::Other(_) => None,
        }
    }
}

impl From<SharedEvent> for Message {
    fn from(event: SharedEvent) -> Self {
        Message::Event(event)
    }
}

/// The sending half of a subscriber's mailbox, plus its identity.
///
/// This is what a transport stores per subscription. Cloning it yields another
/// handle to the same mailbox.
#[derive(Debug, Clone)]
pub struct Mailbox {
    id: MailboxId,
    sender: Sender<Message>,
}

impl Mailbox {
    /// Open a fresh mailbox, returning its address and its receiving end.
    pub fn channel() -> (Mailbox, Inbox) {
        let (sender, receiver) = mpsc::channel();
        let mailbox = Mailbox {
            id: MailboxId::new(),
            sender,
        };
        (mailbox, Inbox::new(receiver))
    }

    pub fn id(&self) -> MailboxId {
        self.id
    }

    /// Deliver a message. Returns `false` once the receiving end is gone.
    pub fn send(&self, message: Message) -> bool {
        self.sender.send(message).is_ok()
    }
}

/// The receiving half of a mailbox.
///
/// Designed for single-threaded consumption: one inbox, one consumer.
#[derive(Debug)]
pub struct Inbox {
    receiver: Receiver<Message>,
}

impl Inbox {
    pub fn new(receiver: Receiver<Message>) -> Self {
        Self { receiver }
    }

    /// Block until the next message is available.
    pub fn recv(&self) -> Result<Message, RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a message without blocking.
    pub fn try_recv(&self) -> Result<Message, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Block for up to `timeout` waiting for a message.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Message, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Drain everything currently queued without blocking.
    pub fn drain(&self) -> Vec<Message> {
        self.receiver.try_iter().collect()
    }
}

/// Topic-based publish/subscribe primitive.
///
/// Implementations must be safe to share across threads; any number of
/// publishers may broadcast concurrently.
pub trait PubSub: Send + Sync {
    type Error: core::fmt::Debug + core::fmt::Display + Send + Sync + 'static;

    /// Make `mailbox` a recipient of `topic`'s broadcasts.
    fn subscribe(&self, topic: &Topic, mailbox: &Mailbox) -> Result<(), Self::Error>;

    /// Stop delivering `topic`'s broadcasts to the mailbox with this id.
    fn unsubscribe(&self, topic: &Topic, mailbox: MailboxId) -> Result<(), Self::Error>;

    /// Deliver `message`, unchanged, to every mailbox subscribed to `topic`.
    fn broadcast(&self, topic: &Topic, message: Message) -> Result<(), Self::Error>;
}

impl<T> PubSub for Arc<T>
where
    T: PubSub + ?Sized,
{
    type Error = T::Error;

    fn subscribe(&self, topic: &Topic, mailbox: &Mailbox) -> Result<(), Self::Error> {
        (**self).subscribe(topic, mailbox)
    }

    fn unsubscribe(&self, topic: &Topic, mailbox: MailboxId) -> Result<(), Self::Error> {
        (**self).unsubscribe(topic, mailbox)
    }

    fn broadcast(&self, topic: &Topic, message: Message) -> Result<(), Self::Error> {
        (**self).broadcast(topic, message)
    }
}
