//! Domain events and the in-process bus that routes them.
//!
//! Flow: a use case builds an [`Event`] → hands it to the [`EventBus`] →
//! the bus computes its topics ([`topics_for`]) → broadcasts once per topic on
//! a [`PubSub`] transport → every [`HandlerRuntime`] subscribed to one of those
//! topics receives it on its own thread.

pub mod bus;
pub mod event;
pub mod handler;
pub mod in_memory_pubsub;
pub mod registry;
pub mod runtime;
pub mod topic;
pub mod transport;

#[cfg(test)]
mod fault_injection;

pub use bus::EventBus;
pub use event::{DomainEvent, Event, EventKind, EventType, SharedEvent};
pub use handler::EventHandler;
pub use in_memory_pubsub::{InMemoryPubSub, TransportError};
pub use registry::{KindDescriptor, RegistryError, verify_registry};
pub use runtime::{
    ChildKind, ChildSpec, HandlerConfig, HandlerHandle, HandlerRuntime, HandlerState, Restart,
    StartError,
};
pub use topic::{Topic, topics_for};
pub use transport::{Inbox, Mailbox, Message, PubSub};

pub use ripple_core::{ConstructionError, ConstructionResult, EventId, MailboxId};
