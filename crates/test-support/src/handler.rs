//! `EventHandler` implementations that record what they see.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ripple_events::{DomainEvent, EventHandler, EventId, SharedEvent, Topic};

use crate::wait::wait_until;

type Predicate = Box<dyn Fn(&dyn DomainEvent) -> bool + Send>;

/// Shared view of everything a [`RecordingHandler`] was handed.
///
/// Clones observe the same record, so a test can keep one while the handler
/// runs on its own thread (or is rebuilt by a supervisor).
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<SharedEvent>>>,
    failures: Arc<AtomicUsize>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of delivered events, in delivery order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn events(&self) -> Vec<SharedEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn event_ids(&self) -> Vec<EventId> {
        self.events().iter().map(|e| e.event_id()).collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of callbacks that returned an error.
    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::SeqCst)
    }

    /// Wait until at least `count` events were delivered.
    pub fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        wait_until(timeout, || self.len() >= count)
    }

    fn record(&self, event: &SharedEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// A handler that records every event it receives.
///
/// Optionally returns an error (`fail_when`) or panics (`panic_when`) for
/// selected events, after recording them.
pub struct RecordingHandler {
    name: String,
    topics: Vec<Topic>,
    recorder: Recorder,
    fail_when: Option<Predicate>,
    panic_when: Option<Predicate>,
}

impl RecordingHandler {
    pub fn new(name: impl Into<String>, topics: impl IntoIterator<Item = Topic>) -> Self {
        Self {
            name: name.into(),
            topics: topics.into_iter().collect(),
            recorder: Recorder::new(),
            fail_when: None,
            panic_when: None,
        }
    }

    /// Record into an existing recorder instead of a fresh one.
    #[must_use]
    pub fn with_recorder(mut self, recorder: Recorder) -> Self {
        self.recorder = recorder;
        self
    }

    #[must_use]
    pub fn fail_when(mut self, predicate: impl Fn(&dyn DomainEvent) -> bool + Send + 'static) -> Self {
        self.fail_when = Some(Box::new(predicate));
        self
    }

    #[must_use]
    pub fn panic_when(mut self, predicate: impl Fn(&dyn DomainEvent) -> bool + Send + 'static) -> Self {
        self.panic_when = Some(Box::new(predicate));
        self
    }

    pub fn recorder(&self) -> Recorder {
        self.recorder.clone()
    }
}

impl EventHandler for RecordingHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn subscriptions(&self) -> Vec<Topic> {
        self.topics.clone()
    }

    fn handle_event(&mut self, event: &SharedEvent) -> anyhow::Result<()> {
        self.recorder.record(event);

        if self.panic_when.as_ref().is_some_and(|p| p(event.as_ref())) {
            panic!("{} panicked on {}", self.name, event.event_id());
        }

        if self.fail_when.as_ref().is_some_and(|p| p(event.as_ref())) {
            self.recorder.failures.fetch_add(1, Ordering::SeqCst);
            anyhow::bail!("{} rejected {}", self.name, event.event_type());
        }

        Ok(())
    }
}
