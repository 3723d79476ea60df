//! Event log subscriber.
//!
//! [`EventLog`] subscribes to the [`EventBus`](crate::bus::EventBus) and
//! records every [`QuestEvent`] through `tracing`. It shuts down when the
//! bus sender is dropped.

use tokio::sync::broadcast;

use crate::bus::QuestEvent;

pub struct EventLog;

impl EventLog {
    /// Run the logging loop until the channel closes.
    pub async fn run(mut receiver: broadcast::Receiver<QuestEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => Self::record(&event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Event log lagged, some events were not recorded");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, event log shutting down");
                    break;
                }
            }
        }
    }

    fn record(event: &QuestEvent) {
        tracing::info!(
            event_type = %event.event_type,
            quest_id = %event.quest_id,
            actor_id = ?event.actor_id,
            recipient = event.recipient.as_deref().unwrap_or("-"),
            payload = %event.payload,
            "Quest event"
        );
    }
}
