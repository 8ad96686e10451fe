//! Host-side supervision of event handlers.

pub mod supervisor;

pub use supervisor::{
    ChildStatus, Supervisor, SupervisorConfig, SupervisorError, SupervisorHandle, SupervisorStats,
};
