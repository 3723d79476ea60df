//! The `quest_invite` email template.
//!
//! Templates live in `templates/` and are rendered with handlebars. The HTML
//! body uses `{{..}}`, which escapes every interpolated value. The subject and
//! plain-text body use `{{{..}}}`.

use std::sync::Arc;

use handlebars::Handlebars;
use questy_core::types::DbId;
use serde::Serialize;

use super::email::EmailError;

/// Registered name of the invitation template.
pub const QUEST_INVITE: &str = "quest_invite";
const QUEST_INVITE_TEXT: &str = "quest_invite_text";
const QUEST_INVITE_SUBJECT: &str = "quest_invite_subject";

/// Everything needed to invite one recipient to a quest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invitation {
    pub quest_id: DbId,
    pub quest_name: String,
    pub recipient_email: String,
    pub recipient_name: String,
    pub sender_name: String,
}

/// A rendered email ready for transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
    pub text: String,
}

#[derive(Serialize)]
struct InviteData<'a> {
    recipient_name: &'a str,
    sender_name: &'a str,
    quest_name: &'a str,
    public_url: &'a str,
    image_url: Option<&'a str>,
}

/// The compiled invitation templates plus the settings shared by every
/// rendered invitation.
#[derive(Clone)]
pub struct InviteTemplate {
    registry: Arc<Handlebars<'static>>,
    /// Link target for the call to action.
    pub public_url: String,
    /// Optional banner image.
    pub image_url: Option<String>,
}

impl InviteTemplate {
    pub fn new(
        public_url: impl Into<String>,
        image_url: Option<String>,
    ) -> Result<Self, EmailError> {
        let mut registry = Handlebars::new();
        registry.register_template_string(
            QUEST_INVITE,
            include_str!("../../templates/quest_invite.html.hbs"),
        )?;
        registry.register_template_string(
            QUEST_INVITE_TEXT,
            include_str!("../../templates/quest_invite.txt.hbs"),
        )?;
        registry.register_template_string(
            QUEST_INVITE_SUBJECT,
            include_str!("../../templates/quest_invite.subject.hbs"),
        )?;

        Ok(Self {
            registry: Arc::new(registry),
            public_url: public_url.into(),
            image_url,
        })
    }

    pub fn render(&self, invitation: &Invitation) -> Result<RenderedEmail, EmailError> {
        let data = InviteData {
            recipient_name: &invitation.recipient_name,
            sender_name: &invitation.sender_name,
            quest_name: &invitation.quest_name,
            public_url: &self.public_url,
            image_url: self.image_url.as_deref(),
        };

        Ok(RenderedEmail {
            subject: self
                .registry
                .render(QUEST_INVITE_SUBJECT, &data)?
                .trim()
                .to_string(),
            html: self.registry.render(QUEST_INVITE, &data)?,
            text: self.registry.render(QUEST_INVITE_TEXT, &data)?,
        })
    }
}

impl std::fmt::Debug for InviteTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InviteTemplate")
            .field("public_url", &self.public_url)
            .field("image_url", &self.image_url)
            .finish_non_exhaustive()
    }
}
