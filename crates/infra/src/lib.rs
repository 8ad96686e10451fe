//! Host-side infrastructure: supervision of handler workers, read-model
//! storage and projection handlers.

pub mod projections;
pub mod read_model;
pub mod supervision;

pub use projections::{ActivityEntry, ActivityFeedError, ActivityFeedProjection, activity_feed};
pub use read_model::{InMemoryWorkspaceStore, WorkspaceStore};
pub use supervision::{
    ChildStatus, Supervisor, SupervisorConfig, SupervisorError, SupervisorHandle, SupervisorStats,
};
