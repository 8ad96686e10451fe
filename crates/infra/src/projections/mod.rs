//! Projection handlers (read model builders).
//!
//! Projections are ordinary event handlers that choose to persist what they
//! see. Their read models are:
//! - **Disposable**: rebuilt from whatever is delivered after a restart
//! - **Workspace-isolated**: data is partitioned by workspace id
//! - **Idempotent**: keyed by event id, safe when a copy arrives twice

pub mod activity_feed;

pub use activity_feed::{ActivityEntry, ActivityFeedError, ActivityFeedProjection, activity_feed};
