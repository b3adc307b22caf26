//! Transport used when no SMTP relay is configured.

use async_trait::async_trait;

use super::{MessageTransport, OutboundMessage, TransportError};

/// Logs messages instead of sending them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTransport;

#[async_trait]
impl MessageTransport for LogTransport {
    async fn send(&self, message: &OutboundMessage) -> Result<(), TransportError> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            body_len = message.body.len(),
            "SMTP not configured, message logged only"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
