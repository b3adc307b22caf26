//! Outbound message transports.
//!
//! The engine only talks to [`MessageTransport`]; which implementation runs
//! is decided at startup from the SMTP configuration.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

pub mod email;
pub mod log;

/// Default number of send attempts before a message counts as failed.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay before the first retry; doubles on each further attempt.
pub const DEFAULT_RETRY_BASE: Duration = Duration::from_secs(1);

/// Build the transport configured in the environment: SMTP when
/// `SMTP_HOST` is set, the log-only transport otherwise.
pub fn transport_from_env() -> Result<Arc<dyn MessageTransport>, TransportError> {
    match email::EmailConfig::from_env() {
        Some(config) => Ok(Arc::new(email::SmtpTransport::new(config)?)),
        None => Ok(Arc::new(self::log::LogTransport)),
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A fully rendered message ready to hand to a transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundMessage {
    pub to: String,
    /// Display name shown next to the sender address.
    pub from_name: Option<String>,
    pub reply_to: Option<String>,
    pub subject: String,
    pub body: String,
}

impl OutboundMessage {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            from_name: None,
            reply_to: None,
            subject: subject.into(),
            body: body.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Worth retrying: connection loss, timeouts, 4xx SMTP replies.
    #[error("Transient transport error: {0}")]
    Transient(String),

    /// The server refused the message for good.
    #[error("Message rejected: {0}")]
    Permanent(String),

    #[error("Email address parse error: {0}")]
    Address(String),

    #[error("Email build error: {0}")]
    Build(String),
}

impl TransportError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

impl From<lettre::address::AddressError> for TransportError {
    fn from(err: lettre::address::AddressError) -> Self {
        Self::Address(err.to_string())
    }
}

impl From<lettre::transport::smtp::Error> for TransportError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        if err.is_permanent() {
            Self::Permanent(err.to_string())
        } else {
            Self::Transient(err.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Transport seam
// ---------------------------------------------------------------------------

#[async_trait]
pub trait MessageTransport: Send + Sync {
    /// Deliver one message. A single bounded I/O call; retries belong to the
    /// caller.
    async fn send(&self, message: &OutboundMessage) -> Result<(), TransportError>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

// ---------------------------------------------------------------------------
// Retry
// ---------------------------------------------------------------------------

/// Bounded exponential backoff for transient failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_RETRY_BASE,
        }
    }
}

impl RetryPolicy {
    /// Delay after the given failed attempt (1-based): base, 2x base, 4x base...
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(factor)
    }
}

/// Send with retry on transient errors.
///
/// Returns the number of attempts used. Permanent, address and build errors
/// are returned immediately.
pub async fn send_with_retry(
    transport: &dyn MessageTransport,
    message: &OutboundMessage,
    policy: RetryPolicy,
) -> Result<u32, TransportError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match transport.send(message).await {
            Ok(()) => return Ok(attempt),
            Err(e) if e.is_transient() && attempt < max_attempts => {
                tracing::warn!(
                    attempt,
                    transport = transport.name(),
                    error = %e,
                    "Send attempt failed, retrying"
                );
                tokio::time::sleep(policy.delay_after(attempt)).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
