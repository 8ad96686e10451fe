//! Workspace-partitioned read model storage.

pub mod workspace_store;

pub use workspace_store::{InMemoryWorkspaceStore, WorkspaceStore};
