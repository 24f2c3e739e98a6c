use serde::Serialize;
use tokio::sync::broadcast;

/// Events buffered per subscriber before a slow consumer starts skipping.
///
/// Course mutations are rare (admin-driven), so a small bound is plenty; a
/// subscriber that lags past it misses the skipped events rather than
/// stalling delivery to everyone else.
const EVENT_BUFFER: usize = 64;

/// Kind of course lifecycle event, mirrored into the SSE `event:` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Create,
    Update,
    Delete,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Create => "create",
            EventKind::Update => "update",
            EventKind::Delete => "delete",
        }
    }
}

/// A lifecycle event with its payload already serialized. Serialization
/// happens once per publish, not once per subscriber.
#[derive(Debug, Clone)]
pub struct CourseEvent {
    pub kind: EventKind,
    pub data: String,
}

/// Fan-out hub for course lifecycle events.
///
/// One receiver per open SSE connection; a subscription ends when its
/// receiver is dropped, so unsubscription is inherently idempotent. There
/// is no replay: a receiver only sees events published after `subscribe`.
#[derive(Clone)]
pub struct EventHub {
    tx: broadcast::Sender<CourseEvent>,
}

impl EventHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_BUFFER);
        Self { tx }
    }

    /// Register a new subscriber. Dropping the receiver unsubscribes it.
    pub fn subscribe(&self) -> broadcast::Receiver<CourseEvent> {
        self.tx.subscribe()
    }

    /// Deliver an event to every current subscriber, best-effort.
    ///
    /// Never fails: a payload that cannot be serialized is logged and
    /// dropped, and delivery problems on individual subscribers (closed or
    /// lagging receivers) never reach the mutating caller.
    pub fn publish<T: Serialize>(&self, kind: EventKind, payload: &T) {
        let data = match serde_json::to_string(payload) {
            Ok(data) => data,
            Err(err) => {
                tracing::error!(kind = kind.as_str(), error = %err, "failed to serialize event payload");
                return;
            }
        };

        // Send only errors when there are no subscribers at all.
        let _ = self.tx.send(CourseEvent { kind, data });
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}
