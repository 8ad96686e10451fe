//! Shared test doubles and utilities for the ripple event bus.

mod bus;
mod handler;
mod wait;

pub use bus::in_memory_bus;
pub use handler::{Recorder, RecordingHandler};
pub use wait::{DEFAULT_TIMEOUT, wait_until};
