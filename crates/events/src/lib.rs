//! Questy event bus and invitation delivery.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`QuestEvent`]: the lifecycle event envelope.
//! - [`EventLog`]: background subscriber that records every event.
//! - [`delivery`]: invitation rendering, SMTP sending and the retrying
//!   [`InvitationQueue`].

pub mod bus;
pub mod delivery;
pub mod log;

pub use bus::{EventBus, QuestEvent};
pub use delivery::email::{EmailConfig, EmailDelivery, EmailError};
pub use delivery::queue::{InvitationQueue, QueueConfig};
pub use delivery::template::{Invitation, InviteTemplate, RenderedEmail};
pub use delivery::InvitationSender;
pub use log::EventLog;
