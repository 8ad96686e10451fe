use crate::event::SharedEvent;
use crate::topic::Topic;

/// A long-lived subscriber reacting to domain events (handler declaration).
///
/// A handler declares the topics it cares about once, at start, and then sees
/// every event broadcast on them through a single callback. It is run by
/// [`HandlerRuntime`](crate::HandlerRuntime) on its own thread, so a slow or
/// blocking callback never holds up the publisher or other handlers.
///
/// ## Errors
///
/// Returning `Err` is a *handled* failure: the runtime logs the reason and
/// keeps the handler running and subscribed. There is no retry. A panic is
/// not caught; it ends the handler thread and is left to whoever supervises
/// it.
///
/// ## Delivery
///
/// Delivery is at-most-once and in-process. A handler subscribed to several
/// topics that one event routes to (e.g. its context topic *and* its
/// workspace topic) receives one copy per matching topic, so callbacks should
/// be idempotent per `event_id`.
pub trait EventHandler: Send + 'static {
    /// Identity used in logs and as the default thread name.
    fn name(&self) -> &str;

    /// Topics of interest. Evaluated once, when the handler starts.
    fn subscriptions(&self) -> Vec<Topic>;

    /// React to one event.
    fn handle_event(&mut self, event: &SharedEvent) -> anyhow::Result<()>;
}

impl<H> EventHandler for Box<H>
where
    H: EventHandler + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    fn subscriptions(&self) -> Vec<Topic> {
        (**self).subscriptions()
    }

    fn handle_event(&mut self, event: &SharedEvent) -> anyhow::Result<()> {
        (**self).handle_event(event)
    }
}
