//! Event handler runtime: one thread per handler.
//!
//! Lifecycle: `Starting → Subscribed → Running → (Stopped | Crashed)`.
//!
//! - **Start** subscribes the handler's mailbox to every declared topic
//!   *before* returning, then spawns the handler thread.
//! - **Running** receives from the mailbox, ignores anything that is not an
//!   event, and invokes the callback. Callback errors are logged, never
//!   retried, never propagated.
//! - **Stop** is requested through the handle; the thread leaves its loop and
//!   releases every subscription. Messages still queued are discarded.
//! - A panicking callback is not caught. The thread unwinds, the runtime
//!   records `Crashed` and releases the subscriptions; restarting is the
//!   supervisor's call (see [`ChildSpec`]).

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tracing::{error, info, trace, warn};

use ripple_core::MailboxId;

use crate::bus::EventBus;
use crate::event::SharedEvent;
use crate::handler::EventHandler;
use crate::topic::Topic;
use crate::transport::{Inbox, Mailbox, Message, PubSub};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HandlerState {
    Starting,
    Subscribed,
    Running,
    Stopped,
    Crashed,
}

/// Handler runtime configuration.
#[derive(Debug, Clone)]
pub struct HandlerConfig {
    /// How long the loop blocks on an empty mailbox before re-checking for a
    /// stop request. Upper bound on stop latency.
    pub poll_interval: Duration,
    /// Thread name; defaults to the handler's name.
    pub thread_name: Option<String>,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(250),
            thread_name: None,
        }
    }
}

impl HandlerConfig {
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = Some(name.into());
        self
    }
}

#[derive(Debug, Error)]
pub enum StartError {
    #[error("handler `{handler}` could not subscribe to `{topic}`: {reason}")]
    Subscribe {
        handler: String,
        topic: Topic,
        reason: String,
    },

    #[error("handler `{handler}` thread could not be spawned")]
    Spawn {
        handler: String,
        #[source]
        source: std::io::Error,
    },
}

/// Handle to observe and stop a running handler.
///
/// Dropping the handle detaches the handler; it keeps running until its
/// mailbox is closed.
#[derive(Debug)]
pub struct HandlerHandle {
    name: String,
    mailbox: Mailbox,
    topics: Vec<Topic>,
    state: Arc<Mutex<HandlerState>>,
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl HandlerHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> HandlerState {
        read_state(&self.state)
    }

    /// Subscribed and not yet stopped or crashed.
    pub fn is_alive(&self) -> bool {
        matches!(
            self.state(),
            HandlerState::Subscribed | HandlerState::Running
        )
    }

    /// The handler's mailbox. Anything may be sent here; non-events are ignored.
    pub fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }

    /// Topics the handler subscribed to at start.
    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    /// Request stop and wait for the handler thread to exit.
    pub fn stop(mut self) {
        let _ = self.shutdown.send(());
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

/// Starts handlers and describes them to a supervisor.
#[derive(Debug)]
pub struct HandlerRuntime;

impl HandlerRuntime {
    /// Subscribe `handler` to its declared topics, then run it on its own thread.
    ///
    /// On return the handler is fully subscribed: any event emitted afterwards
    /// on one of its topics will reach it. If a subscription fails, the ones
    /// already made are rolled back.
    pub fn start<H, T>(
        handler: H,
        bus: EventBus<T>,
        config: HandlerConfig,
    ) -> Result<HandlerHandle, StartError>
    where
        H: EventHandler,
        T: PubSub + 'static,
    {
        let name = handler.name().to_string();
        let topics = handler.subscriptions();
        let state = Arc::new(Mutex::new(HandlerState::Starting));
        let (mailbox, inbox) = Mailbox::channel();

        for (subscribed, topic) in topics.iter().enumerate() {
            if let Err(err) = bus.subscribe(topic, &mailbox) {
                for done in &topics[..subscribed] {
                    let _ = bus.unsubscribe(done, mailbox.id());
                }
                return Err(StartError::Subscribe {
                    handler: name,
                    topic: topic.clone(),
                    reason: err.to_string(),
                });
            }
        }

        write_state(&state, HandlerState::Subscribed);
        info!(handler = %name, topics = topics.len(), "event handler subscribed");

        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let worker = Worker {
            name: name.clone(),
            handler,
            inbox,
            shutdown: shutdown_rx,
            bus,
            mailbox: mailbox.id(),
            topics: topics.clone(),
            state: Arc::clone(&state),
            poll_interval: config.poll_interval,
        };

        // If spawning fails the closure is dropped, and with it the worker,
        // which releases the subscriptions.
        let join = thread::Builder::new()
            .name(config.thread_name.unwrap_or_else(|| name.clone()))
            .spawn(move || worker.run())
            .map_err(|source| StartError::Spawn {
                handler: name.clone(),
                source,
            })?;

        Ok(HandlerHandle {
            name,
            mailbox,
            topics,
            state,
            shutdown: shutdown_tx,
            join: Some(join),
        })
    }

    /// Supervision descriptor: a permanent worker whose start function builds
    /// a fresh handler from `factory` and starts it on `bus`.
    pub fn child_spec<H, F, T>(factory: F, bus: EventBus<T>, config: HandlerConfig) -> ChildSpec
    where
        H: EventHandler,
        F: Fn() -> H + Send + Sync + 'static,
        T: PubSub + Clone + 'static,
    {
        ChildSpec::new(std::any::type_name::<H>(), move || {
            HandlerRuntime::start(factory(), bus.clone(), config.clone())
        })
    }
}

/// What to do when a supervised child exits.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Restart {
    /// Always restart.
    Permanent,
    /// Restart only after a crash.
    Transient,
    /// Never restart.
    Temporary,
}

impl Restart {
    pub fn should_restart(&self, exit: HandlerState) -> bool {
        match self {
            Restart::Permanent => matches!(exit, HandlerState::Stopped | HandlerState::Crashed),
            Restart::Transient => exit == HandlerState::Crashed,
            Restart::Temporary => false,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ChildKind {
    Worker,
    Supervisor,
}

pub type StartFn = Box<dyn Fn() -> Result<HandlerHandle, StartError> + Send + Sync>;

/// How a supervisor should run a handler: identity, start function, process
/// kind, restart policy.
pub struct ChildSpec {
    pub id: String,
    pub kind: ChildKind,
    pub restart: Restart,
    start: StartFn,
}

impl ChildSpec {
    /// A permanent worker.
    pub fn new<F>(id: impl Into<String>, start: F) -> Self
    where
        F: Fn() -> Result<HandlerHandle, StartError> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            kind: ChildKind::Worker,
            restart: Restart::Permanent,
            start: Box::new(start),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_restart(mut self, restart: Restart) -> Self {
        self.restart = restart;
        self
    }

    pub fn start(&self) -> Result<HandlerHandle, StartError> {
        (self.start)()
    }
}

impl core::fmt::Debug for ChildSpec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ChildSpec")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("restart", &self.restart)
            .finish_non_exhaustive()
    }
}

struct Worker<H, T>
where
    H: EventHandler,
    T: PubSub,
{
    name: String,
    handler: H,
    inbox: Inbox,
    shutdown: mpsc::Receiver<()>,
    bus: EventBus<T>,
    mailbox: MailboxId,
    topics: Vec<Topic>,
    state: Arc<Mutex<HandlerState>>,
    poll_interval: Duration,
}

impl<H, T> Worker<H, T>
where
    H: EventHandler,
    T: PubSub,
{
    fn run(mut self) {
        write_state(&self.state, HandlerState::Running);

        loop {
            // Shutdown check (non-blocking)
            if self.shutdown.try_recv().is_ok() {
                break;
            }

            match self.inbox.recv_timeout(self.poll_interval) {
                Ok(Message::Event(event)) => self.deliver(&event),
                Ok(Message::Other(message)) => {
                    trace!(handler = %self.name, message = %message, "ignoring non-event message");
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    }

    fn deliver(&mut self, event: &SharedEvent) {
        if let Err(err) = self.handler.handle_event(event) {
            warn!(
                handler = %self.name,
                event_type = %event.event_type(),
                event_id = %event.event_id(),
                error = ?err,
                "event handler callback failed"
            );
        }
    }
}

impl<H, T> Drop for Worker<H, T>
where
    H: EventHandler,
    T: PubSub,
{
    fn drop(&mut self) {
        for topic in &self.topics {
            if let Err(err) = self.bus.unsubscribe(topic, self.mailbox) {
                warn!(handler = %self.name, topic = %topic, error = %err, "failed to unsubscribe handler");
            }
        }

        if thread::panicking() {
            write_state(&self.state, HandlerState::Crashed);
            error!(handler = %self.name, "event handler crashed");
        } else {
            write_state(&self.state, HandlerState::Stopped);
            info!(handler = %self.name, "event handler stopped");
        }
    }
}

fn read_state(state: &Mutex<HandlerState>) -> HandlerState {
    *state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn write_state(state: &Mutex<HandlerState>, next: HandlerState) {
    *state.lock().unwrap_or_else(PoisonError::into_inner) = next;
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use serde::{Deserialize, Serialize};
    use serde_json::json;

    use super::*;
    use crate::event::{DomainEvent, Event, EventKind};
    use crate::fault_injection::BrokenTopicPubSub;
    use crate::in_memory_pubsub::InMemoryPubSub;

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    struct TaskAssigned {
        title: String,
    }

    impl EventKind for TaskAssigned {
        const CONTEXT: &'static str = "projects";
        const EVENT_NAME: &'static str = "task_assigned";
        const AGGREGATE_TYPE: &'static str = "task";
    }

    /// Forwards every delivered event; fails on aggregate "boom", panics on "panic".
    struct Recorder {
        seen: mpsc::Sender<SharedEvent>,
    }

    impl EventHandler for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn subscriptions(&self) -> Vec<Topic> {
            vec![Topic::context("projects"), Topic::workspace("ws-1")]
        }

        fn handle_event(&mut self, event: &SharedEvent) -> anyhow::Result<()> {
            let _ = self.seen.send(event.clone());
            match event.aggregate_id() {
                "boom" => anyhow::bail!("boom"),
                "panic" => panic!("handler blew up"),
                _ => Ok(()),
            }
        }
    }

    type Bus = EventBus<Arc<InMemoryPubSub>>;

    fn config() -> HandlerConfig {
        HandlerConfig::default().with_poll_interval(Duration::from_millis(10))
    }

    fn start_recorder() -> (Bus, HandlerHandle, mpsc::Receiver<SharedEvent>) {
        let bus = EventBus::new(Arc::new(InMemoryPubSub::new()));
        let (tx, rx) = mpsc::channel();
        let handle = HandlerRuntime::start(Recorder { seen: tx }, bus.clone(), config()).unwrap();
        (bus, handle, rx)
    }

    fn task(aggregate_id: &str) -> Event<TaskAssigned> {
        Event::new(json!({
            "aggregate_id": aggregate_id,
            "actor_id": "user-1",
            "title": "write docs",
        }))
        .unwrap()
    }

    fn wait_for_state(handle: &HandlerHandle, expected: HandlerState) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if handle.state() == expected {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn start_returns_only_once_fully_subscribed() {
        let (bus, handle, _rx) = start_recorder();

        assert!(handle.is_alive());
        assert_eq!(bus.transport().subscriber_count(&Topic::context("projects")), 1);
        assert_eq!(bus.transport().subscriber_count(&Topic::workspace("ws-1")), 1);
        assert_eq!(handle.topics().len(), 2);
        assert_eq!(handle.name(), "recorder");

        handle.stop();
    }

    #[test]
    fn failed_subscription_rolls_back_the_ones_already_made() {
        // Recorder subscribes to `events:projects` first, then `events:workspace:ws-1`.
        let transport = Arc::new(BrokenTopicPubSub::new(Topic::workspace("ws-1")));
        let bus = EventBus::new(Arc::clone(&transport));
        let (tx, _rx) = mpsc::channel();

        let err = HandlerRuntime::start(Recorder { seen: tx }, bus, config()).unwrap_err();

        match err {
            StartError::Subscribe { handler, topic, reason } => {
                assert_eq!(handler, "recorder");
                assert_eq!(topic, Topic::workspace("ws-1"));
                assert!(reason.contains("unavailable"));
            }
            other => panic!("expected a subscribe error, got {other:?}"),
        }
        assert!(transport.inner.active_topics().is_empty());
    }

    #[test]
    fn events_on_declared_topics_reach_the_callback() {
        let (bus, handle, rx) = start_recorder();

        let event = task("task-1");
        let event_id = event.event_id();
        bus.emit(event);

        let delivered = rx.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(delivered.event_id(), event_id);

        handle.stop();
    }

    #[test]
    fn callback_error_is_logged_and_handler_keeps_running() {
        let (bus, handle, rx) = start_recorder();

        bus.emit(task("boom"));
        let failed = rx.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(failed.aggregate_id(), "boom");

        bus.emit(task("task-2"));
        let next = rx.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(next.aggregate_id(), "task-2");

        assert!(handle.is_alive());
        assert_eq!(bus.transport().subscriber_count(&Topic::context("projects")), 1);

        handle.stop();
    }

    #[test]
    fn non_event_messages_are_ignored() {
        let (_bus, handle, rx) = start_recorder();

        assert!(handle.mailbox().send(Message::Other("{:tick, 1}".into())));

        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
        assert!(handle.is_alive());

        handle.stop();
    }

    #[test]
    fn stop_releases_every_subscription() {
        let (bus, handle, _rx) = start_recorder();
        let state = Arc::clone(&handle.state);

        handle.stop();

        assert_eq!(read_state(&state), HandlerState::Stopped);
        assert!(bus.transport().active_topics().is_empty());
    }

    #[test]
    fn panicking_callback_crashes_the_handler_and_drops_its_subscriptions() {
        let (bus, handle, rx) = start_recorder();

        bus.emit(task("panic"));
        rx.recv_timeout(Duration::from_secs(1)).unwrap();

        assert!(wait_for_state(&handle, HandlerState::Crashed));
        assert!(!handle.is_alive());
        assert!(bus.transport().active_topics().is_empty());

        handle.stop();
    }

    #[test]
    fn child_spec_describes_a_permanent_worker() {
        let bus = EventBus::new(Arc::new(InMemoryPubSub::new()));
        let spec = HandlerRuntime::child_spec(
            || {
                let (tx, _rx) = mpsc::channel();
                Recorder { seen: tx }
            },
            bus.clone(),
            config(),
        );

        assert!(spec.id.ends_with("Recorder"));
        assert_eq!(spec.kind, ChildKind::Worker);
        assert_eq!(spec.restart, Restart::Permanent);

        let handle = spec.start().unwrap();
        assert!(handle.is_alive());
        handle.stop();
    }

    #[test]
    fn restart_policies() {
        assert!(Restart::Permanent.should_restart(HandlerState::Stopped));
        assert!(Restart::Permanent.should_restart(HandlerState::Crashed));
        assert!(!Restart::Transient.should_restart(HandlerState::Stopped));
        assert!(Restart::Transient.should_restart(HandlerState::Crashed));
        assert!(!Restart::Temporary.should_restart(HandlerState::Crashed));
        assert!(!Restart::Permanent.should_restart(HandlerState::Running));
    }
}
