//! Supervisor for event handler workers.
//!
//! Runs a fixed set of [`ChildSpec`]s, watches their state and restarts the
//! ones that exited according to their [`Restart`](ripple_events::Restart)
//! policy. A restarted handler goes through the full start sequence again, so
//! it is resubscribed to its topics before it is considered running. Events
//! broadcast while a handler is down are not replayed.
//!
//! Restart intensity is bounded: more than `max_restarts` restarts within
//! `max_window` and the supervisor stops every child and gives up.

use std::collections::VecDeque;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

use ripple_events::{ChildSpec, HandlerHandle, HandlerState, StartError};

/// Supervisor configuration.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Name for logging and the supervisor thread.
    pub name: String,
    /// How often children are checked.
    pub check_interval: Duration,
    /// Maximum restarts tolerated within `max_window`.
    pub max_restarts: usize,
    pub max_window: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            name: "event-handlers".to_string(),
            check_interval: Duration::from_millis(50),
            max_restarts: 3,
            max_window: Duration::from_secs(5),
        }
    }
}

impl SupervisorConfig {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_check_interval(mut self, interval: Duration) -> Self {
        self.check_interval = interval;
        self
    }

    pub fn with_max_restarts(mut self, max: usize, window: Duration) -> Self {
        self.max_restarts = max;
        self.max_window = window;
        self
    }
}

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("child `{id}` failed to start")]
    Child {
        id: String,
        #[source]
        source: StartError,
    },

    #[error("supervisor thread could not be spawned")]
    Spawn(#[source] std::io::Error),

    #[error("supervisor thread exited during startup")]
    Exited,
}

/// Supervisor runtime statistics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SupervisorStats {
    pub restarts: u64,
    pub failed_restarts: u64,
    /// Restart intensity was exceeded and every child was stopped.
    pub gave_up: bool,
}

/// Last observed state of one child; `None` while it is not running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildStatus {
    pub id: String,
    pub state: Option<HandlerState>,
}

/// Handle to observe and shut down a running supervisor.
#[derive(Debug)]
pub struct SupervisorHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
    stats: Arc<Mutex<SupervisorStats>>,
    children: Arc<Mutex<Vec<ChildStatus>>>,
}

impl SupervisorHandle {
    pub fn stats(&self) -> SupervisorStats {
        lock(&self.stats).clone()
    }

    pub fn children(&self) -> Vec<ChildStatus> {
        lock(&self.children).clone()
    }

    pub fn child(&self, id: &str) -> Option<ChildStatus> {
        self.children().into_iter().find(|c| c.id == id)
    }

    /// Stop every child (in reverse start order) and wait for the supervisor.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

struct Child {
    spec: ChildSpec,
    handle: Option<HandlerHandle>,
    pending_restart: bool,
}

/// Supervises handler workers on a background thread.
#[derive(Debug)]
pub struct Supervisor;

impl Supervisor {
    /// Start every child in order, then supervise them.
    ///
    /// Returns once all children are running (and therefore subscribed). If
    /// any child fails to start, the ones already started are stopped.
    pub fn start(
        specs: Vec<ChildSpec>,
        config: SupervisorConfig,
    ) -> Result<SupervisorHandle, SupervisorError> {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), SupervisorError>>();
        let stats = Arc::new(Mutex::new(SupervisorStats::default()));
        let statuses = Arc::new(Mutex::new(Vec::new()));

        let loop_stats = Arc::clone(&stats);
        let loop_statuses = Arc::clone(&statuses);
        let join = thread::Builder::new()
            .name(config.name.clone())
            .spawn(move || {
                let children = match start_children(specs) {
                    Ok(children) => children,
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };
                publish(&children, &loop_statuses);
                let _ = ready_tx.send(Ok(()));
                supervisor_loop(children, config, shutdown_rx, loop_stats, loop_statuses);
            })
            .map_err(SupervisorError::Spawn)?;

        let started = ready_rx.recv().unwrap_or(Err(SupervisorError::Exited));
        if let Err(err) = started {
            let _ = join.join();
            return Err(err);
        }

        Ok(SupervisorHandle {
            shutdown: shutdown_tx,
            join: Some(join),
            stats,
            children: statuses,
        })
    }
}

fn start_children(specs: Vec<ChildSpec>) -> Result<Vec<Child>, SupervisorError> {
    let mut children = Vec::with_capacity(specs.len());

    for spec in specs {
        match spec.start() {
            Ok(handle) => children.push(Child {
                spec,
                handle: Some(handle),
                pending_restart: false,
            }),
            Err(source) => {
                stop_children(&mut children);
                return Err(SupervisorError::Child {
                    id: spec.id.clone(),
                    source,
                });
            }
        }
    }

    Ok(children)
}

fn supervisor_loop(
    mut children: Vec<Child>,
    config: SupervisorConfig,
    shutdown_rx: mpsc::Receiver<()>,
    stats: Arc<Mutex<SupervisorStats>>,
    statuses: Arc<Mutex<Vec<ChildStatus>>>,
) {
    info!(supervisor = %config.name, children = children.len(), "supervisor started");
    let mut recent_restarts: VecDeque<Instant> = VecDeque::new();

    loop {
        let mut give_up = false;

        for child in children.iter_mut() {
            if let Some(exit) = reap(child) {
                if child.spec.restart.should_restart(exit) {
                    child.pending_restart = true;
                } else {
                    info!(supervisor = %config.name, child = %child.spec.id, state = ?exit, "child exited; not restarting");
                }
            }

            if child.pending_restart {
                if !admit_restart(&mut recent_restarts, &config) {
                    give_up = true;
                    break;
                }
                restart(child, &config, &stats);
            }
        }

        publish(&children, &statuses);

        if give_up {
            error!(
                supervisor = %config.name,
                max_restarts = config.max_restarts,
                "restart intensity exceeded; stopping all children"
            );
            lock(&stats).gave_up = true;
            break;
        }

        match shutdown_rx.recv_timeout(config.check_interval) {
            Ok(()) => break,
            Err(RecvTimeoutError::Timeout) => {}
            // Handle dropped: keep supervising, but don't spin.
            Err(RecvTimeoutError::Disconnected) => thread::sleep(config.check_interval),
        }
    }

    stop_children(&mut children);
    publish(&children, &statuses);
    info!(supervisor = %config.name, "supervisor stopped");
}

/// If the child's handler has exited, collect it and return how it ended.
fn reap(child: &mut Child) -> Option<HandlerState> {
    let state = child.handle.as_ref()?.state();
    if !matches!(state, HandlerState::Stopped | HandlerState::Crashed) {
        return None;
    }

    if let Some(handle) = child.handle.take() {
        handle.stop();
    }
    Some(state)
}

fn admit_restart(recent: &mut VecDeque<Instant>, config: &SupervisorConfig) -> bool {
    let now = Instant::now();
    while recent
        .front()
        .is_some_and(|t| now.duration_since(*t) > config.max_window)
    {
        recent.pop_front();
    }

    if recent.len() >= config.max_restarts {
        return false;
    }
    recent.push_back(now);
    true
}

fn restart(child: &mut Child, config: &SupervisorConfig, stats: &Mutex<SupervisorStats>) {
    match child.spec.start() {
        Ok(handle) => {
            child.handle = Some(handle);
            child.pending_restart = false;
            lock(stats).restarts += 1;
            info!(supervisor = %config.name, child = %child.spec.id, "child restarted");
        }
        Err(err) => {
            lock(stats).failed_restarts += 1;
            warn!(supervisor = %config.name, child = %child.spec.id, error = %err, "child restart failed");
        }
    }
}

fn stop_children(children: &mut [Child]) {
    for child in children.iter_mut().rev() {
        child.pending_restart = false;
        if let Some(handle) = child.handle.take() {
            handle.stop();
        }
    }
}

fn publish(children: &[Child], statuses: &Mutex<Vec<ChildStatus>>) {
    *lock(statuses) = children
        .iter()
        .map(|c| ChildStatus {
            id: c.spec.id.clone(),
            state: c.handle.as_ref().map(HandlerHandle::state),
        })
        .collect();
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use ripple_domain::MessagePosted;
    use ripple_events::{
        DomainEvent, Event, EventBus, HandlerConfig, HandlerRuntime, InMemoryPubSub, Restart,
        Topic,
    };
    use ripple_test_support::{DEFAULT_TIMEOUT, Recorder, RecordingHandler, in_memory_bus, wait_until};

    fn handler_config() -> HandlerConfig {
        HandlerConfig::default().with_poll_interval(Duration::from_millis(10))
    }

    fn config() -> SupervisorConfig {
        SupervisorConfig::default()
            .with_name("test-supervisor")
            .with_check_interval(Duration::from_millis(10))
    }

    /// A chat handler that panics on messages whose aggregate id is "panic".
    fn flaky_child(bus: &EventBus<Arc<InMemoryPubSub>>, recorder: &Recorder) -> ChildSpec {
        let recorder = recorder.clone();
        HandlerRuntime::child_spec(
            move || {
                RecordingHandler::new("flaky", [Topic::context("chat")])
                    .with_recorder(recorder.clone())
                    .panic_when(|e| e.aggregate_id() == "panic")
            },
            bus.clone(),
            handler_config(),
        )
        .with_id("flaky")
    }

    fn message(aggregate_id: &str) -> Event<MessagePosted> {
        Event::new(json!({
            "aggregate_id": aggregate_id,
            "actor_id": "user-1",
            "channel_id": "general",
            "body": "hello",
        }))
        .unwrap()
    }

    #[test]
    fn crashed_permanent_child_is_restarted_and_resubscribed() {
        let bus = in_memory_bus();
        let recorder = Recorder::new();
        let supervisor = Supervisor::start(vec![flaky_child(&bus, &recorder)], config()).unwrap();

        bus.emit(message("panic"));
        assert!(wait_until(DEFAULT_TIMEOUT, || supervisor.stats().restarts == 1));
        assert!(wait_until(DEFAULT_TIMEOUT, || {
            supervisor.child("flaky").and_then(|c| c.state) == Some(HandlerState::Running)
        }));
        assert_eq!(bus.transport().subscriber_count(&Topic::context("chat")), 1);

        bus.emit(message("msg-2"));
        assert!(recorder.wait_for(2, DEFAULT_TIMEOUT));
        assert_eq!(recorder.events()[1].aggregate_id(), "msg-2");

        supervisor.shutdown();
    }

    #[test]
    fn temporary_child_is_left_down() {
        let bus = in_memory_bus();
        let recorder = Recorder::new();
        let spec = flaky_child(&bus, &recorder).with_restart(Restart::Temporary);
        let supervisor = Supervisor::start(vec![spec], config()).unwrap();

        bus.emit(message("panic"));
        assert!(wait_until(DEFAULT_TIMEOUT, || {
            supervisor.child("flaky").is_some_and(|c| c.state.is_none())
        }));
        assert_eq!(supervisor.stats().restarts, 0);
        assert!(bus.transport().active_topics().is_empty());

        supervisor.shutdown();
    }

    #[test]
    fn exceeding_restart_intensity_stops_everything() {
        let bus = in_memory_bus();
        let recorder = Recorder::new();
        let bystander_spec = HandlerRuntime::child_spec(
            || RecordingHandler::new("bystander", [Topic::context("documents")]),
            bus.clone(),
            handler_config(),
        )
        .with_id("bystander");

        let supervisor = Supervisor::start(
            vec![flaky_child(&bus, &recorder), bystander_spec],
            config().with_max_restarts(1, Duration::from_secs(60)),
        )
        .unwrap();

        bus.emit(message("panic"));
        assert!(wait_until(DEFAULT_TIMEOUT, || supervisor.stats().restarts == 1));
        assert!(wait_until(DEFAULT_TIMEOUT, || {
            supervisor.child("flaky").and_then(|c| c.state) == Some(HandlerState::Running)
        }));

        bus.emit(message("panic"));
        assert!(wait_until(DEFAULT_TIMEOUT, || supervisor.stats().gave_up));
        assert!(wait_until(DEFAULT_TIMEOUT, || {
            supervisor.children().iter().all(|c| c.state.is_none())
        }));
        assert!(bus.transport().active_topics().is_empty());

        supervisor.shutdown();
    }

    #[test]
    fn failing_child_start_aborts_startup() {
        let bus = in_memory_bus();
        let recorder = Recorder::new();
        let broken = ChildSpec::new("broken", || {
            Err(StartError::Subscribe {
                handler: "broken".into(),
                topic: Topic::context("chat"),
                reason: "transport unavailable".into(),
            })
        });

        let err = Supervisor::start(vec![flaky_child(&bus, &recorder), broken], config()).unwrap_err();

        assert!(matches!(err, SupervisorError::Child { ref id, .. } if id == "broken"));
        assert!(bus.transport().active_topics().is_empty());
    }

    #[test]
    fn shutdown_stops_children_and_releases_topics() {
        let bus = in_memory_bus();
        let recorder = Recorder::new();
        let supervisor = Supervisor::start(vec![flaky_child(&bus, &recorder)], config()).unwrap();
        assert_eq!(supervisor.children().len(), 1);

        supervisor.shutdown();

        assert!(bus.transport().active_topics().is_empty());
    }
}
