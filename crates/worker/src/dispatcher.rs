//! Action execution.
//!
//! The [`Dispatcher`] turns a `Fire` decision into side effects. Every
//! firing goes through [`RuleStore::claim`] first, so the firing record and
//! the writes belonging to it commit together or not at all. Messages are
//! sent while the claim is held; a failed send releases the claim and the
//! next tick retries.

use std::sync::Arc;

use chrono::FixedOffset;
use recruitflow_core::action::{
    Action, NotificationAction, PurgeAction, Recipient, SendMessageAction,
};
use recruitflow_core::channels::{CHANNEL_DIGEST, CHANNEL_IN_APP};
use recruitflow_core::error::ConfigError;
use recruitflow_core::firing::FiringKey;
use recruitflow_core::notification::{delivery_plan, is_quiet, EmailDelivery};
use recruitflow_core::retention::{self, RetentionSettings};
use recruitflow_core::subject::{SubjectContext, SubjectKind};
use recruitflow_core::template_render::{self, subject_variables, TemplateVars};
use recruitflow_core::types::Timestamp;
use recruitflow_db::models::applicant::PurgeReport;
use recruitflow_db::models::audit::{NewAuditEntry, OUTCOME_SEND_FAILED};
use recruitflow_db::models::client::ClientSettings;
use recruitflow_db::models::notification::NewNotification;
use recruitflow_db::models::review_queue::NewReviewItem;
use recruitflow_events::{send_with_retry, MessageTransport, OutboundMessage, RetryPolicy, TransportError};
use serde::Serialize;

use crate::message::{local_today, render_template, sender_profile};
use crate::rule::Rule;
use crate::store::{Claim, FiringClaim, NotificationTarget, RuleStore, StoreError};

/// What a dispatch did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Fired,
    /// The rendered message waits for manual approval.
    QueuedForReview,
    /// The client is in quiet mode; nothing was written.
    Suppressed,
    /// Another pass recorded this firing first.
    AlreadyFired,
    /// The rule was deactivated between evaluation and dispatch.
    RuleInactive,
    Purged(PurgeReport),
    /// A previous purge failure has not been acknowledged yet.
    AwaitingAcknowledgement,
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Invalid rule configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Delivery failed after retries: {0}")]
    Transient(TransportError),

    /// Missing or unusable data (template, recipient address). Treated like
    /// a configuration error: logged and retried on the next tick.
    #[error("{0}")]
    Data(String),

    #[error("Purge aborted: {0}")]
    Destructive(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct Dispatcher {
    store: Arc<dyn RuleStore>,
    transport: Arc<dyn MessageTransport>,
    retry: RetryPolicy,
    offset: FixedOffset,
    portal_base_url: String,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn RuleStore>,
        transport: Arc<dyn MessageTransport>,
        retry: RetryPolicy,
        offset: FixedOffset,
        portal_base_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            transport,
            retry,
            offset,
            portal_base_url: portal_base_url.into(),
        }
    }

    /// Execute `rule`'s action for `subject` under firing key `key`.
    pub async fn dispatch(
        &self,
        rule: &Rule,
        subject: &SubjectContext,
        key: &FiringKey,
        now: Timestamp,
    ) -> Result<Outcome, DispatchError> {
        match &rule.action {
            Action::SendMessage(action) => self.send_message(rule, subject, action, key, now).await,
            Action::RaiseNotification(action) => {
                self.raise_notification(rule, subject, action, key, now)
                    .await
            }
            Action::PurgeExpired(action) => self.purge(rule, action, now).await,
        }
    }

    // ----------------------------------------------------------------------
    // send_message
    // ----------------------------------------------------------------------

    async fn send_message(
        &self,
        rule: &Rule,
        subject: &SubjectContext,
        action: &SendMessageAction,
        key: &FiringKey,
        now: Timestamp,
    ) -> Result<Outcome, DispatchError> {
        let template = self
            .store
            .template(rule.client_id, &action.template_slug)
            .await?
            .filter(|t| t.is_active)
            .ok_or_else(|| {
                DispatchError::Data(format!(
                    "template '{}' does not exist or is inactive",
                    action.template_slug
                ))
            })?;
        let settings = self.store.client_settings(rule.client_id).await?;

        let recipient = match &action.recipient {
            Some(recipient) => recipient.clone(),
            None => Recipient::parse(&template.recipient_type)?,
        };
        let to = resolve_address(&recipient, subject, settings.as_ref())?;

        let vars = self.variables(subject, settings.as_ref(), now);
        let rendered = render_template(&template, &vars, settings.as_ref());

        let mut claim = match self.store.claim(rule.client_id, key, now).await? {
            Claim::Claimed(claim) => claim,
            Claim::AlreadyFired => return Ok(Outcome::AlreadyFired),
            Claim::RuleInactive => return Ok(Outcome::RuleInactive),
        };

        if template.review_before_send {
            claim
                .queue_for_review(&NewReviewItem {
                    client_id: rule.client_id,
                    rule_kind: rule.rule.kind.as_str().to_string(),
                    rule_id: rule.rule.id,
                    template_slug: template.slug.clone(),
                    subject_type: subject.subject.kind.as_str().to_string(),
                    subject_id: subject.subject.id,
                    recipient: to,
                    subject: rendered.subject,
                    body: rendered.body,
                })
                .await?;
            claim.commit().await?;
            return Ok(Outcome::QueuedForReview);
        }

        let message = OutboundMessage {
            to,
            from_name: from_name(settings.as_ref()),
            reply_to: settings.as_ref().and_then(|s| s.reply_to_email.clone()),
            subject: rendered.subject,
            body: rendered.body,
        };

        match send_with_retry(self.transport.as_ref(), &message, self.retry).await {
            Ok(_) => {
                if let Err(e) = claim.commit().await {
                    tracing::error!(
                        rule = %rule.rule,
                        subject_id = subject.subject.id,
                        error = %e,
                        "Message sent but the firing record could not be committed",
                    );
                    return Err(e.into());
                }
                Ok(Outcome::Fired)
            }
            Err(e) => {
                release(claim).await;
                if e.is_transient() {
                    Err(DispatchError::Transient(e))
                } else {
                    Err(DispatchError::Data(e.to_string()))
                }
            }
        }
    }

    // ----------------------------------------------------------------------
    // raise_notification
    // ----------------------------------------------------------------------

    async fn raise_notification(
        &self,
        rule: &Rule,
        subject: &SubjectContext,
        action: &NotificationAction,
        key: &FiringKey,
        now: Timestamp,
    ) -> Result<Outcome, DispatchError> {
        let settings = self.store.client_settings(rule.client_id).await?;
        if is_quiet(settings.as_ref().and_then(|s| s.quiet_mode_until), now) {
            return Ok(Outcome::Suppressed);
        }

        let targets = self
            .store
            .notification_targets(rule.client_id, &action.event_type)
            .await?;
        let vars = self.variables(subject, settings.as_ref(), now);
        let title = template_render::render(&action.title, &vars);
        let body = action
            .body
            .as_deref()
            .map(|b| template_render::render(b, &vars));
        let link = action
            .link
            .as_deref()
            .map(|l| template_render::render(l, &vars));

        let mut claim = match self.store.claim(rule.client_id, key, now).await? {
            Claim::Claimed(claim) => claim,
            Claim::AlreadyFired => return Ok(Outcome::AlreadyFired),
            Claim::RuleInactive => return Ok(Outcome::RuleInactive),
        };

        let mut instant = Vec::new();
        for target in &targets {
            let plan = delivery_plan(target.preference);
            let row = |channel: &str| NewNotification {
                client_id: rule.client_id,
                user_id: target.user_id,
                event_type: action.event_type.clone(),
                title: title.clone(),
                body: body.clone(),
                link: link.clone(),
                channel: channel.to_string(),
                subject_type: subject_type(subject),
                subject_id: subject_type(subject).map(|_| subject.subject.id),
            };

            if plan.portal {
                claim.insert_notification(&row(CHANNEL_IN_APP)).await?;
            }
            match plan.email {
                EmailDelivery::Instant => {
                    instant.push(notification_email(target, &title, body.as_deref(), link.as_deref()))
                }
                EmailDelivery::Digest => {
                    claim.insert_notification(&row(CHANNEL_DIGEST)).await?;
                }
                EmailDelivery::None => {}
            }
        }
        claim.commit().await?;

        // The firing is recorded; instant copies are best effort.
        for message in instant {
            if let Err(e) = send_with_retry(self.transport.as_ref(), &message, self.retry).await {
                tracing::warn!(
                    rule = %rule.rule,
                    to = %message.to,
                    error = %e,
                    "Instant notification email failed",
                );
                let entry = NewAuditEntry {
                    client_id: rule.client_id,
                    rule_kind: Some(rule.rule.kind.as_str().to_string()),
                    rule_id: Some(rule.rule.id),
                    subject_type: Some(subject.subject.kind.as_str().to_string()),
                    subject_id: Some(subject.subject.id),
                    outcome: OUTCOME_SEND_FAILED,
                    message: format!("Notification email to {} failed: {e}", message.to),
                    details: serde_json::json!({ "event_type": action.event_type }),
                    requires_ack: false,
                };
                if let Err(e) = self.store.record_audit(entry).await {
                    tracing::error!(error = %e, "Failed to write audit entry");
                }
            }
        }

        Ok(Outcome::Fired)
    }

    // ----------------------------------------------------------------------
    // purge_expired
    // ----------------------------------------------------------------------

    async fn purge(
        &self,
        rule: &Rule,
        action: &PurgeAction,
        now: Timestamp,
    ) -> Result<Outcome, DispatchError> {
        if self.store.has_open_alert(rule.rule).await? {
            return Ok(Outcome::AwaitingAcknowledgement);
        }

        let settings = self.store.client_settings(rule.client_id).await?;
        let retention = RetentionSettings {
            auto_archive_months: settings.as_ref().map(|s| s.auto_archive_months),
            auto_delete_months: settings.as_ref().map(|s| s.auto_delete_months),
        };
        let plan = retention::plan(action, retention, now)?;

        match self.store.purge(rule.client_id, rule.rule, plan, now).await {
            Ok(Some(report)) => Ok(Outcome::Purged(report)),
            Ok(None) => Ok(Outcome::RuleInactive),
            Err(e) => Err(DispatchError::Destructive(e.to_string())),
        }
    }

    fn variables(
        &self,
        subject: &SubjectContext,
        settings: Option<&ClientSettings>,
        now: Timestamp,
    ) -> TemplateVars {
        subject_variables(
            subject,
            &sender_profile(settings, &self.portal_base_url),
            local_today(now, self.offset),
            self.offset,
        )
    }
}

fn resolve_address(
    recipient: &Recipient,
    subject: &SubjectContext,
    settings: Option<&ClientSettings>,
) -> Result<String, DispatchError> {
    let address = match recipient {
        Recipient::Applicant => subject.email.clone(),
        Recipient::Client => settings.and_then(|s| s.reply_to_email.clone()),
        Recipient::Address(address) => Some(address.clone()),
    };
    address
        .filter(|a| !a.trim().is_empty())
        .ok_or_else(|| {
            DispatchError::Data(format!(
                "no email address for recipient {recipient:?} of {} {}",
                subject.subject.kind, subject.subject.id
            ))
        })
}

fn from_name(settings: Option<&ClientSettings>) -> Option<String> {
    settings.and_then(|s| s.sender_name.clone().or_else(|| s.company_name.clone()))
}

/// Client-wide firings are not linked to a record.
fn subject_type(subject: &SubjectContext) -> Option<String> {
    (subject.subject.kind != SubjectKind::Client).then(|| subject.subject.kind.as_str().to_string())
}

fn notification_email(
    target: &NotificationTarget,
    title: &str,
    body: Option<&str>,
    link: Option<&str>,
) -> OutboundMessage {
    let mut text = body.unwrap_or(title).to_string();
    if let Some(link) = link {
        text.push_str("\n\n");
        text.push_str(link);
    }
    OutboundMessage::new(target.email.clone(), title, text)
}

async fn release(claim: Box<dyn FiringClaim>) {
    if let Err(e) = claim.release().await {
        tracing::warn!(error = %e, "Failed to release firing claim");
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};

    use super::*;

    fn subject() -> SubjectContext {
        let created = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
        let mut subject = SubjectContext::applicant(1, 7, created);
        subject.email = Some("anna@example.com".to_string());
        subject
    }

    #[test]
    fn applicant_recipient_uses_subject_email() {
        assert_eq!(
            resolve_address(&Recipient::Applicant, &subject(), None).unwrap(),
            "anna@example.com"
        );
    }

    #[test]
    fn missing_address_is_a_data_error() {
        let mut s = subject();
        s.email = Some("  ".to_string());
        assert_matches!(
            resolve_address(&Recipient::Applicant, &s, None),
            Err(DispatchError::Data(_))
        );
        assert_matches!(
            resolve_address(&Recipient::Client, &s, None),
            Err(DispatchError::Data(_))
        );
    }

    #[test]
    fn notification_email_appends_link() {
        let target = NotificationTarget {
            user_id: 3,
            email: "team@acme.test".to_string(),
            preference: None,
        };
        let message = notification_email(&target, "Neue Bewerbung", None, Some("https://portal.test/a/7"));
        assert_eq!(message.to, "team@acme.test");
        assert_eq!(message.subject, "Neue Bewerbung");
        assert_eq!(message.body, "Neue Bewerbung\n\nhttps://portal.test/a/7");
    }

    #[test]
    fn client_scope_is_not_linked() {
        let created = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
        let client = SubjectContext::client_scope(1, created);
        assert_eq!(subject_type(&client), None);
        assert_eq!(subject_type(&subject()).as_deref(), Some("applicant"));
    }
}
