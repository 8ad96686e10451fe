//! Polling helper for asserting on asynchronous delivery.

use std::thread;
use std::time::{Duration, Instant};

/// Generous upper bound for in-process delivery in tests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Poll `condition` every few milliseconds until it holds or `timeout` passes.
/// Returns whether it held.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(5));
    }
}
