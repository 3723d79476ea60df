//! Invitation delivery.
//!
//! A sent quest produces an [`Invitation`](template::Invitation) that is
//! rendered from the `quest_invite` template and handed to an
//! [`InvitationSender`] by the background [`InvitationQueue`](queue::InvitationQueue).

pub mod email;
pub mod queue;
pub mod template;

use async_trait::async_trait;

use self::email::EmailError;
use self::template::RenderedEmail;

/// Transport seam for outgoing invitation emails.
#[async_trait]
pub trait InvitationSender: Send + Sync {
    async fn send(&self, to_email: &str, message: &RenderedEmail) -> Result<(), EmailError>;
}
