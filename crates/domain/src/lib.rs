//! Declared domain event kinds, one module per business context.
//!
//! Kinds are plain records; construction, routing and delivery live in
//! `ripple-events`. Every kind declared here must also be listed in
//! [`registry::all`].

pub mod accounts;
pub mod agents;
pub mod chat;
pub mod documents;
pub mod notifications;
pub mod projects;
pub mod registry;
pub mod workspaces;

pub use accounts::{UserDeactivated, UserRegistered};
pub use agents::{AgentCreated, AgentRunCompleted};
pub use chat::MessagePosted;
pub use documents::{DocumentCreated, DocumentDeleted, DocumentUpdated};
pub use notifications::NotificationRequested;
pub use projects::{ProjectArchived, ProjectCreated};
pub use workspaces::{MemberInvited, MemberRemoved, WorkspaceCreated};
