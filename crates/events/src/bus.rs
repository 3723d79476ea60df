//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`QuestEvent`]s. It is
//! shared via `Arc<EventBus>` across the application.

use chrono::{DateTime, Utc};
use questy_core::types::DbId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// Quest lifecycle event names.
pub mod event_types {
    pub const QUEST_CREATED: &str = "quest.created";
    pub const QUEST_UPDATED: &str = "quest.updated";
    pub const QUEST_DELETED: &str = "quest.deleted";
    pub const QUEST_SENT: &str = "quest.sent";
    pub const QUEST_STARTED: &str = "quest.started";
    pub const QUEST_STEP_COMPLETED: &str = "quest.step_completed";
    pub const QUEST_FINISHED: &str = "quest.finished";
}

// ---------------------------------------------------------------------------
// QuestEvent
// ---------------------------------------------------------------------------

/// A lifecycle event on a quest or one of its assignments.
///
/// Constructed via [`QuestEvent::new`] and enriched with the builder
/// methods [`with_actor`](QuestEvent::with_actor),
/// [`with_recipient`](QuestEvent::with_recipient) and
/// [`with_payload`](QuestEvent::with_payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestEvent {
    /// Dot-separated event name, e.g. `"quest.sent"`.
    pub event_type: String,

    pub quest_id: DbId,

    /// Owner id when the owner triggered the event.
    pub actor_id: Option<DbId>,

    /// Recipient email for assignment events.
    pub recipient: Option<String>,

    /// Free-form JSON payload carrying event-specific data.
    pub payload: serde_json::Value,

    pub timestamp: DateTime<Utc>,
}

impl QuestEvent {
    pub fn new(event_type: impl Into<String>, quest_id: DbId) -> Self {
        Self {
            event_type: event_type.into(),
            quest_id,
            actor_id: None,
            recipient: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    pub fn with_actor(mut self, actor_id: DbId) -> Self {
        self.actor_id = Some(actor_id);
        self
    }

    pub fn with_recipient(mut self, email: impl Into<String>) -> Self {
        self.recipient = Some(email.into());
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// ```rust
/// use questy_events::bus::{event_types, EventBus, QuestEvent};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(QuestEvent::new(event_types::QUEST_CREATED, uuid::Uuid::nil()));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<QuestEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest un-consumed messages are dropped
    /// and slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers. Never blocks.
    pub fn publish(&self, event: QuestEvent) {
        // A SendError only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<QuestEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
