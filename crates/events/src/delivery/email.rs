//! Invitation delivery via SMTP.
//!
//! [`EmailDelivery`] wraps the `lettre` async SMTP transport. Configuration
//! is loaded from environment variables; if `SMTP_HOST` is not set,
//! [`EmailConfig::from_env`] returns `None` and no mailer is constructed.

use async_trait::async_trait;
use lettre::message::MultiPart;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::template::RenderedEmail;
use super::InvitationSender;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),

    /// An email template failed to compile.
    #[error("Email template error: {0}")]
    Template(#[from] handlebars::TemplateError),

    /// An email template failed to render.
    #[error("Email render error: {0}")]
    Render(#[from] handlebars::RenderError),
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when `SMTP_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "Questy <noreply@questy.fun>";

/// Configuration for the SMTP transport.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    /// RFC 5322 "From" mailbox.
    pub from_address: String,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `SMTP_HOST` is not set.
    ///
    /// | Variable        | Required | Default                       |
    /// |-----------------|----------|-------------------------------|
    /// | `SMTP_HOST`     | yes      |                               |
    /// | `SMTP_PORT`     | no       | `587`                         |
    /// | `SMTP_FROM`     | no       | `Questy <noreply@questy.fun>` |
    /// | `SMTP_USER`     | no       |                               |
    /// | `SMTP_PASSWORD` | no       |                               |
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
        })
    }
}

// ---------------------------------------------------------------------------
// EmailDelivery
// ---------------------------------------------------------------------------

/// Sends rendered invitations via SMTP.
pub struct EmailDelivery {
    config: EmailConfig,
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl EmailDelivery {
    /// Build the SMTP transport. Connections are opened lazily on send.
    pub fn new(config: EmailConfig) -> Result<Self, EmailError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port);

        if let (Some(user), Some(pass)) = (&config.smtp_user, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            mailer: builder.build(),
            config,
        })
    }

    /// Assemble a multipart (plain text + HTML) message.
    pub fn build_message(
        from: &str,
        to_email: &str,
        message: &RenderedEmail,
    ) -> Result<Message, EmailError> {
        Message::builder()
            .from(from.parse()?)
            .to(to_email.parse()?)
            .subject(message.subject.clone())
            .multipart(MultiPart::alternative_plain_html(
                message.text.clone(),
                message.html.clone(),
            ))
            .map_err(|e| EmailError::Build(e.to_string()))
    }
}

#[async_trait]
impl InvitationSender for EmailDelivery {
    async fn send(&self, to_email: &str, message: &RenderedEmail) -> Result<(), EmailError> {
        let email = Self::build_message(&self.config.from_address, to_email, message)?;
        self.mailer.send(email).await?;
        tracing::info!(to = to_email, "Invitation email sent");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
