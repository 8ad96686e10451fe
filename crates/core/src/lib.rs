//! Shared building blocks for the domain-event bus.
//!
//! Pure types only: the construction error model and strongly-typed identifiers.

pub mod error;
pub mod id;

pub use error::{ConstructionError, ConstructionResult};
pub use id::{EventId, MailboxId};
