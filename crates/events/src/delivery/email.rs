//! Email delivery via SMTP.
//!
//! [`SmtpTransport`] wraps the `lettre` async SMTP transport to send
//! plain-text messages. Configuration is loaded from environment variables;
//! if `SMTP_HOST` is not set, [`EmailConfig::from_env`] returns `None` and
//! the log-only transport should be used instead.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::{MessageTransport, OutboundMessage, TransportError};

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when `SMTP_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "noreply@recruitflow.local";

/// Configuration for the SMTP transport.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// SMTP server hostname.
    pub smtp_host: String,
    /// SMTP server port (defaults to 587).
    pub smtp_port: u16,
    /// Envelope and header "From" address.
    pub from_address: String,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `SMTP_HOST` is not set, signalling that email
    /// delivery is not configured.
    ///
    /// | Variable        | Required | Default                     |
    /// |-----------------|----------|-----------------------------|
    /// | `SMTP_HOST`     | yes      |                             |
    /// | `SMTP_PORT`     | no       | `587`                       |
    /// | `SMTP_FROM`     | no       | `noreply@recruitflow.local` |
    /// | `SMTP_USER`     | no       |                             |
    /// | `SMTP_PASSWORD` | no       |                             |
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
// SmtpTransport
// ---------------------------------------------------------------------------

/// Sends messages through an SMTP relay.
pub struct SmtpTransport {
    from_address: String,
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpTransport {
    /// Build the relay connection settings. No connection is opened yet.
    pub fn new(config: EmailConfig) -> Result<Self, TransportError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port);

        if let (Some(user), Some(pass)) = (&config.smtp_user, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            from_address: config.from_address,
            mailer: builder.build(),
        })
    }

    fn build_message(&self, message: &OutboundMessage) -> Result<Message, TransportError> {
        build_message(&self.from_address, message)
    }
}

/// Assemble the MIME message for `message`, sent from `from_address`.
fn build_message(from_address: &str, message: &OutboundMessage) -> Result<Message, TransportError> {
    let from = Mailbox::new(message.from_name.clone(), from_address.parse()?);
    let mut builder = Message::builder()
        .from(from)
        .to(message.to.parse()?)
        .subject(message.subject.as_str())
        .header(ContentType::TEXT_PLAIN);

    if let Some(reply_to) = &message.reply_to {
        builder = builder.reply_to(reply_to.parse()?);
    }

    builder
        .body(message.body.clone())
        .map_err(|e| TransportError::Build(e.to_string()))
}

#[async_trait]
impl MessageTransport for SmtpTransport {
    async fn send(&self, message: &OutboundMessage) -> Result<(), TransportError> {
        let email = self.build_message(message)?;
        self.mailer.send(email).await?;

        tracing::info!(to = %message.to, subject = %message.subject, "Email sent");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn from_env_returns_none_without_smtp_host() {
        std::env::remove_var("SMTP_HOST");
        assert!(EmailConfig::from_env().is_none());
    }

    #[test]
    fn builds_message_with_sender_name_and_reply_to() {
        let mut message = OutboundMessage::new("anna@example.test", "Ihre Bewerbung", "Hallo");
        message.from_name = Some("Acme Recruiting".to_string());
        message.reply_to = Some("hr@acme.test".to_string());

        let email = build_message("noreply@recruitflow.local", &message).unwrap();
        let raw = String::from_utf8(email.formatted()).unwrap();
        assert!(raw.contains("Acme Recruiting"));
        assert!(raw.contains("Reply-To: hr@acme.test"));
        assert!(raw.contains("To: anna@example.test"));
    }

    #[test]
    fn invalid_recipient_is_an_address_error() {
        let message = OutboundMessage::new("not-an-email", "Betreff", "Text");
        assert_matches!(
            build_message("noreply@recruitflow.local", &message),
            Err(TransportError::Address(_))
        );
    }
}
