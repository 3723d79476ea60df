use std::sync::Arc;

use questy_events::{EventBus, InvitationQueue};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: inner data is behind `Arc` or is already `Clone`.
#[derive(Clone)]
pub struct AppState {
    pub pool: questy_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Event Notifier for quest lifecycle events.
    pub event_bus: Arc<EventBus>,
    /// Invitation producer. `None` when mailing is disabled or SMTP is not
    /// configured.
    pub invitations: Option<InvitationQueue>,
}
