//! A fresh in-memory bus per test.

use std::sync::Arc;

use ripple_events::{EventBus, InMemoryPubSub};

/// A bus over its own private in-memory transport.
pub fn in_memory_bus() -> EventBus<Arc<InMemoryPubSub>> {
    EventBus::new(Arc::new(InMemoryPubSub::new()))
}
