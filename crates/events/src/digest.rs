//! Digest notification scheduler.
//!
//! [`DigestScheduler`] runs as a background task. On every interval it finds
//! users with undelivered `digest` channel notifications, sends each of them
//! one summary email and marks the summarised rows delivered. Clients in
//! quiet mode are skipped until their quiet period ends.

use std::sync::Arc;
use std::time::Duration;

use recruitflow_core::channels::CHANNEL_DIGEST;
use recruitflow_db::models::notification::{DigestRecipient, Notification};
use recruitflow_db::repositories::NotificationRepo;
use recruitflow_db::DbPool;
use tokio_util::sync::CancellationToken;

use crate::delivery::{send_with_retry, MessageTransport, OutboundMessage, RetryPolicy, TransportError};

/// Default interval between digest runs.
pub const DEFAULT_DIGEST_INTERVAL: Duration = Duration::from_secs(3600);

#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

// ---------------------------------------------------------------------------
// DigestScheduler
// ---------------------------------------------------------------------------

/// Background service that flushes batched notifications by email.
pub struct DigestScheduler {
    pool: DbPool,
    transport: Arc<dyn MessageTransport>,
    interval: Duration,
    retry: RetryPolicy,
}

impl DigestScheduler {
    pub fn new(pool: DbPool, transport: Arc<dyn MessageTransport>) -> Self {
        Self {
            pool,
            transport,
            interval: DEFAULT_DIGEST_INTERVAL,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Run the digest loop until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Digest scheduler cancelled");
                    break;
                }
                _ = interval.tick() => {
                    if let Err(e) = self.process_digests().await {
                        tracing::error!(error = %e, "Failed to process digests");
                    }
                }
            }
        }
    }

    /// Send one digest per user with pending rows. Returns the number of
    /// digests sent; failures for one user do not stop the others.
    pub async fn process_digests(&self) -> Result<usize, DigestError> {
        let recipients = NotificationRepo::pending_recipients(&self.pool, CHANNEL_DIGEST).await?;

        let mut sent = 0;
        for recipient in &recipients {
            match self.send_digest(recipient).await {
                Ok(true) => sent += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(
                        client_id = recipient.client_id,
                        user_id = recipient.user_id,
                        error = %e,
                        "Failed to send digest for user"
                    );
                }
            }
        }

        if sent > 0 {
            tracing::info!(count = sent, "Processed digest deliveries");
        }
        Ok(sent)
    }

    /// Deliver a digest for a single user.
    ///
    /// Only rows read before sending are marked delivered, so rows written
    /// meanwhile go out with the next digest.
    async fn send_digest(&self, recipient: &DigestRecipient) -> Result<bool, DigestError> {
        let pending =
            NotificationRepo::list_pending_for_channel(&self.pool, recipient.user_id, CHANNEL_DIGEST)
                .await?;
        let Some(last_id) = pending.iter().map(|n| n.id).max() else {
            return Ok(false);
        };

        let message = compose_digest(&recipient.email, &pending);
        send_with_retry(self.transport.as_ref(), &message, self.retry).await?;

        let marked = NotificationRepo::mark_channel_delivered(
            &self.pool,
            recipient.user_id,
            CHANNEL_DIGEST,
            last_id,
        )
        .await?;

        tracing::info!(
            client_id = recipient.client_id,
            user_id = recipient.user_id,
            notification_count = marked,
            "Digest delivered"
        );
        Ok(true)
    }
}

/// Build the summary email for a batch of notifications, oldest first.
pub fn compose_digest(to: &str, notifications: &[Notification]) -> OutboundMessage {
    let subject = match notifications.len() {
        1 => "1 neue Benachrichtigung".to_string(),
        n => format!("{n} neue Benachrichtigungen"),
    };

    let mut body = String::from("Hier ist Ihre Zusammenfassung:\n\n");
    for n in notifications {
        body.push_str("- ");
        body.push_str(&n.title);
        body.push('\n');
        if let Some(text) = n.body.as_deref().filter(|t| !t.is_empty()) {
            body.push_str("  ");
            body.push_str(text);
            body.push('\n');
        }
        if let Some(link) = &n.link {
            body.push_str("  ");
            body.push_str(link);
            body.push('\n');
        }
    }

    OutboundMessage::new(to, subject, body)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
