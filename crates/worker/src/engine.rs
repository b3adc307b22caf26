//! The rule engine: one evaluation pass over every active rule, plus the
//! inline path for record events.
//!
//! A tick groups rules by client, evaluates each rule against the client's
//! open subjects and dispatches the due firings concurrently. Failures are
//! isolated per client, per rule and per firing; none of them abort the
//! tick.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use chrono::FixedOffset;
use futures::stream::{self, StreamExt};
use recruitflow_core::firing::{FiringKey, RuleRef};
use recruitflow_core::subject::{SubjectContext, SubjectKind, SubjectRef};
use recruitflow_core::trigger::SubjectEvent;
use recruitflow_core::types::{DbId, Timestamp};
use recruitflow_db::models::audit::{
    NewAuditEntry, OUTCOME_FIRED, OUTCOME_PURGED, OUTCOME_PURGE_FAILED,
    OUTCOME_QUEUED_FOR_REVIEW, OUTCOME_SEND_FAILED,
};
use recruitflow_db::models::automation::Automation;
use recruitflow_db::models::reminder::Reminder;
use recruitflow_events::MessageTransport;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::dispatcher::{DispatchError, Dispatcher, Outcome};
use crate::evaluator::{evaluate, Decision};
use crate::rule::Rule;
use crate::store::{RuleStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Unknown subject: {kind} {id}")]
    UnknownSubject { kind: SubjectKind, id: DbId },

    #[error("Invalid event: {0}")]
    InvalidEvent(String),
}

/// A record event reported by the record store.
///
/// `payload` carries the kind-specific fields, e.g. `{"from_status": ..,
/// "to_status": ..}` for `status_changed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundEvent {
    pub subject_type: SubjectKind,
    pub subject_id: DbId,
    pub event_kind: String,
    #[serde(default)]
    pub payload: Value,
}

impl InboundEvent {
    pub fn subject(&self) -> SubjectRef {
        SubjectRef {
            kind: self.subject_type,
            id: self.subject_id,
        }
    }

    /// Decode the event into its typed form.
    pub fn subject_event(&self) -> Result<SubjectEvent, EngineError> {
        let mut fields = match &self.payload {
            Value::Object(map) => map.clone(),
            Value::Null => serde_json::Map::new(),
            _ => {
                return Err(EngineError::InvalidEvent(
                    "payload must be an object".to_string(),
                ))
            }
        };
        fields.insert(
            "event_kind".to_string(),
            Value::String(self.event_kind.clone()),
        );
        serde_json::from_value(Value::Object(fields))
            .map_err(|e| EngineError::InvalidEvent(e.to_string()))
    }
}

/// Result of one rule for an inline event.
#[derive(Debug, Clone, Serialize)]
pub struct RuleOutcome {
    pub rule: RuleRef,
    #[serde(flatten)]
    pub result: EventResult,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum EventResult {
    Dispatched { outcome: Outcome },
    /// Outside the send window; a later tick fires it.
    Deferred { until: Timestamp },
    Failed { error: String },
}

/// Counters of one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TickReport {
    pub tick_id: Uuid,
    pub rules: usize,
    pub config_errors: usize,
    pub evaluated: usize,
    pub dispatched: usize,
    pub fired: usize,
    pub queued_for_review: usize,
    pub deferred: usize,
    pub suppressed: usize,
    pub skipped: usize,
    pub purged: u64,
    pub failed: usize,
    /// Due firings not started because the tick was stopped.
    pub abandoned: usize,
}

impl TickReport {
    fn record(&mut self, result: &Result<Outcome, DispatchError>) {
        match result {
            Ok(Outcome::Fired) => self.fired += 1,
            Ok(Outcome::QueuedForReview) => self.queued_for_review += 1,
            Ok(Outcome::Suppressed) => self.suppressed += 1,
            Ok(Outcome::AlreadyFired)
            | Ok(Outcome::RuleInactive)
            | Ok(Outcome::AwaitingAcknowledgement) => self.skipped += 1,
            Ok(Outcome::Purged(report)) => self.purged += report.archived + report.deleted,
            Err(DispatchError::Config(_)) | Err(DispatchError::Data(_)) => self.config_errors += 1,
            Err(_) => self.failed += 1,
        }
    }
}

struct Job {
    rule: Arc<Rule>,
    subject: SubjectContext,
    key: FiringKey,
}

pub struct Engine {
    store: Arc<dyn RuleStore>,
    dispatcher: Dispatcher,
    offset: FixedOffset,
    concurrency: usize,
}

impl Engine {
    pub fn new(
        store: Arc<dyn RuleStore>,
        transport: Arc<dyn MessageTransport>,
        config: &EngineConfig,
    ) -> Self {
        let dispatcher = Dispatcher::new(
            Arc::clone(&store),
            transport,
            config.retry,
            config.utc_offset,
            config.portal_base_url.clone(),
        );
        Self {
            store,
            dispatcher,
            offset: config.utc_offset,
            concurrency: config.dispatch_concurrency.max(1),
        }
    }

    /// Run one evaluation pass at `now`.
    ///
    /// Only a failure to load the rule set fails the tick; everything below
    /// that is logged and counted in the report.
    pub async fn tick(&self, now: Timestamp) -> Result<TickReport, StoreError> {
        self.tick_until(now, &CancellationToken::new()).await
    }

    /// Like [`tick`](Self::tick), but stops starting firings once `stop` is
    /// cancelled. Firings that already hold a claim run to commit or
    /// release; the rest are left for the next tick.
    pub async fn tick_until(
        &self,
        now: Timestamp,
        stop: &CancellationToken,
    ) -> Result<TickReport, StoreError> {
        let tick_id = Uuid::now_v7();
        let span = tracing::info_span!("tick", %tick_id);
        self.run_tick(tick_id, now, stop).instrument(span).await
    }

    async fn run_tick(
        &self,
        tick_id: Uuid,
        now: Timestamp,
        stop: &CancellationToken,
    ) -> Result<TickReport, StoreError> {
        let automations = self.store.active_automations().await?;
        let reminders = self.store.active_reminders().await?;

        let mut by_client: BTreeMap<DbId, (Vec<Automation>, Vec<Reminder>)> = BTreeMap::new();
        for row in automations {
            by_client.entry(row.client_id).or_default().0.push(row);
        }
        for row in reminders {
            by_client.entry(row.client_id).or_default().1.push(row);
        }

        let mut report = TickReport {
            tick_id,
            ..TickReport::default()
        };
        let mut jobs = Vec::new();
        for (client_id, (automations, reminders)) in &by_client {
            if stop.is_cancelled() {
                break;
            }
            match self
                .plan_client(*client_id, automations, reminders, now, &mut report)
                .await
            {
                Ok(mut client_jobs) => jobs.append(&mut client_jobs),
                Err(e) => {
                    report.failed += 1;
                    tracing::error!(client_id, error = %e, "Failed to evaluate client rules");
                }
            }
        }

        report.dispatched = jobs.len();
        let results: Vec<_> = stream::iter(jobs)
            .map(|job| async move {
                if stop.is_cancelled() {
                    return None;
                }
                Some(self.execute(&job, now).await)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;
        for result in &results {
            match result {
                Some(result) => report.record(result),
                None => report.abandoned += 1,
            }
        }

        tracing::info!(
            rules = report.rules,
            evaluated = report.evaluated,
            fired = report.fired,
            queued = report.queued_for_review,
            deferred = report.deferred,
            failed = report.failed,
            abandoned = report.abandoned,
            "Tick complete",
        );
        Ok(report)
    }

    /// Evaluate one client's rules and collect the firings to dispatch.
    async fn plan_client(
        &self,
        client_id: DbId,
        automations: &[Automation],
        reminders: &[Reminder],
        now: Timestamp,
        report: &mut TickReport,
    ) -> Result<Vec<Job>, StoreError> {
        let pipeline = self.store.pipeline(client_id).await?;

        let mut rules = Vec::new();
        for row in automations {
            match Rule::from_automation(row, &pipeline) {
                Ok(rule) => rules.push(Arc::new(rule)),
                Err(e) => {
                    report.config_errors += 1;
                    tracing::warn!(
                        client_id,
                        automation_id = row.id,
                        error = %e,
                        "Skipping automation with invalid configuration",
                    );
                }
            }
        }
        for row in reminders {
            match Rule::from_reminder(row, &pipeline) {
                Ok(stages) => rules.extend(stages.into_iter().map(Arc::new)),
                Err(e) => {
                    report.config_errors += 1;
                    tracing::warn!(
                        client_id,
                        reminder_id = row.id,
                        error = %e,
                        "Skipping reminder with invalid configuration",
                    );
                }
            }
        }
        report.rules += rules.len();

        let needs = |kind: SubjectKind| rules.iter().any(|r| r.trigger.scope() == kind);
        let applicants = if needs(SubjectKind::Applicant) {
            self.store.open_subjects(client_id).await?
        } else {
            Vec::new()
        };
        let client_scope = if needs(SubjectKind::Client) {
            self.store.subject(SubjectRef::client(client_id)).await?
        } else {
            None
        };

        let mut history: HashMap<RuleRef, HashSet<FiringKey>> = HashMap::new();
        let mut jobs = Vec::new();
        for rule in &rules {
            let subjects: &[SubjectContext] = match rule.trigger.scope() {
                SubjectKind::Applicant => &applicants,
                SubjectKind::Client => client_scope.as_slice(),
                SubjectKind::Campaign => &[],
            };
            if subjects.is_empty() {
                continue;
            }
            if rule.action.records_firing() && !history.contains_key(&rule.rule) {
                let keys = self.store.firing_history(rule.rule).await?;
                history.insert(rule.rule, keys.into_iter().collect());
            }
            let fired = history.get(&rule.rule);

            for subject in subjects {
                report.evaluated += 1;
                match evaluate(rule, subject, now, self.offset, None) {
                    Decision::Fire { key } => {
                        if fired.is_some_and(|f| f.contains(&key)) {
                            continue;
                        }
                        jobs.push(Job {
                            rule: Arc::clone(rule),
                            subject: subject.clone(),
                            key,
                        });
                    }
                    Decision::Deferred { key, until } => {
                        if fired.is_some_and(|f| f.contains(&key)) {
                            continue;
                        }
                        report.deferred += 1;
                        tracing::info!(
                            rule = %rule.rule,
                            subject_id = subject.subject.id,
                            %until,
                            "Firing deferred until the send window opens",
                        );
                    }
                    Decision::NotDue(_) | Decision::ConditionsFailed => {}
                }
            }
        }
        Ok(jobs)
    }

    /// Evaluate a record event inline against the client's event-driven
    /// automations.
    pub async fn notify_event(
        &self,
        event: &InboundEvent,
        now: Timestamp,
    ) -> Result<Vec<RuleOutcome>, EngineError> {
        let span = tracing::info_span!(
            "event",
            subject_type = %event.subject_type,
            subject_id = event.subject_id,
            event_kind = %event.event_kind,
        );
        self.handle_event(event, now).instrument(span).await
    }

    async fn handle_event(
        &self,
        event: &InboundEvent,
        now: Timestamp,
    ) -> Result<Vec<RuleOutcome>, EngineError> {
        let subject_event = event.subject_event()?;
        let subject = self
            .store
            .subject(event.subject())
            .await?
            .ok_or(EngineError::UnknownSubject {
                kind: event.subject_type,
                id: event.subject_id,
            })?;

        let client_id = subject.client_id;
        let automations = self.store.active_automations_for_client(client_id).await?;
        let pipeline = self.store.pipeline(client_id).await?;

        let mut outcomes = Vec::new();
        for row in &automations {
            let rule = match Rule::from_automation(row, &pipeline) {
                Ok(rule) if rule.trigger.is_event_driven() => Arc::new(rule),
                Ok(_) => continue,
                Err(e) => {
                    tracing::warn!(
                        client_id,
                        automation_id = row.id,
                        error = %e,
                        "Skipping automation with invalid configuration",
                    );
                    continue;
                }
            };

            let result = match evaluate(&rule, &subject, now, self.offset, Some(&subject_event)) {
                Decision::Fire { key } => {
                    let job = Job {
                        rule: Arc::clone(&rule),
                        subject: subject.clone(),
                        key,
                    };
                    match self.execute(&job, now).await {
                        Ok(outcome) => EventResult::Dispatched { outcome },
                        Err(e) => EventResult::Failed {
                            error: e.to_string(),
                        },
                    }
                }
                Decision::Deferred { until, .. } => EventResult::Deferred { until },
                Decision::NotDue(_) | Decision::ConditionsFailed => continue,
            };
            outcomes.push(RuleOutcome {
                rule: rule.rule,
                result,
            });
        }
        Ok(outcomes)
    }

    /// Dispatch one firing, then log and audit its outcome.
    async fn execute(&self, job: &Job, now: Timestamp) -> Result<Outcome, DispatchError> {
        let result = self
            .dispatcher
            .dispatch(&job.rule, &job.subject, &job.key, now)
            .await;
        self.report_outcome(job, &result).await;
        result
    }

    async fn report_outcome(&self, job: &Job, result: &Result<Outcome, DispatchError>) {
        let rule = &job.rule;
        let subject = job.subject.subject;
        let audit = |outcome: &'static str, message: String, details: Value, requires_ack: bool| {
            NewAuditEntry {
                client_id: rule.client_id,
                rule_kind: Some(rule.rule.kind.as_str().to_string()),
                rule_id: Some(rule.rule.id),
                subject_type: Some(subject.kind.as_str().to_string()),
                subject_id: Some(subject.id),
                outcome,
                message,
                details,
                requires_ack,
            }
        };

        let entry = match result {
            Ok(Outcome::Fired) => {
                tracing::info!(
                    rule = %rule.rule,
                    subject_id = subject.id,
                    action = rule.action.kind(),
                    "Rule fired",
                );
                Some(audit(
                    OUTCOME_FIRED,
                    format!("{} fired", rule.name),
                    json!({ "action": rule.action.kind(), "episode": job.key.episode }),
                    false,
                ))
            }
            Ok(Outcome::QueuedForReview) => {
                tracing::info!(rule = %rule.rule, subject_id = subject.id, "Message queued for review");
                Some(audit(
                    OUTCOME_QUEUED_FOR_REVIEW,
                    format!("{} queued a message for review", rule.name),
                    json!({ "episode": job.key.episode }),
                    false,
                ))
            }
            Ok(Outcome::Purged(report)) if report.archived + report.deleted > 0 => {
                tracing::info!(
                    rule = %rule.rule,
                    archived = report.archived,
                    deleted = report.deleted,
                    "Retention purge applied",
                );
                Some(audit(
                    OUTCOME_PURGED,
                    format!(
                        "{} archived {} and deleted {} applicants",
                        rule.name, report.archived, report.deleted
                    ),
                    json!(report),
                    false,
                ))
            }
            Ok(outcome) => {
                tracing::debug!(rule = %rule.rule, subject_id = subject.id, ?outcome, "Nothing to do");
                None
            }
            Err(e @ (DispatchError::Config(_) | DispatchError::Data(_))) => {
                tracing::warn!(rule = %rule.rule, subject_id = subject.id, error = %e, "Rule skipped");
                None
            }
            Err(DispatchError::Transient(e)) => {
                tracing::error!(rule = %rule.rule, subject_id = subject.id, error = %e, "Send failed after retries");
                Some(audit(
                    OUTCOME_SEND_FAILED,
                    format!("{}: {e}", rule.name),
                    json!({ "episode": job.key.episode }),
                    false,
                ))
            }
            Err(DispatchError::Destructive(e)) => {
                tracing::error!(rule = %rule.rule, error = %e, "Purge failed; rule paused until acknowledged");
                Some(audit(
                    OUTCOME_PURGE_FAILED,
                    format!("{}: {e}", rule.name),
                    Value::Null,
                    true,
                ))
            }
            Err(DispatchError::Store(e)) => {
                tracing::error!(rule = %rule.rule, subject_id = subject.id, error = %e, "Dispatch failed");
                None
            }
        };

        if let Some(entry) = entry {
            if let Err(e) = self.store.record_audit(entry).await {
                tracing::error!(rule = %rule.rule, error = %e, "Failed to write audit entry");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn decodes_status_change_event() {
        let event: InboundEvent = serde_json::from_value(json!({
            "subject_type": "applicant",
            "subject_id": 7,
            "event_kind": "status_changed",
            "payload": {"from_status": "Neu", "to_status": "Qualifiziert"}
        }))
        .unwrap();
        assert_eq!(event.subject(), SubjectRef::applicant(7));
        assert_matches!(
            event.subject_event(),
            Ok(SubjectEvent::StatusChanged { to_status, .. }) if to_status == "Qualifiziert"
        );
    }

    #[test]
    fn rejects_malformed_payloads() {
        let event = InboundEvent {
            subject_type: SubjectKind::Applicant,
            subject_id: 7,
            event_kind: "status_changed".to_string(),
            payload: json!(["Qualifiziert"]),
        };
        assert_matches!(event.subject_event(), Err(EngineError::InvalidEvent(_)));

        let unknown = InboundEvent {
            event_kind: "exploded".to_string(),
            payload: Value::Null,
            ..event
        };
        assert_matches!(unknown.subject_event(), Err(EngineError::InvalidEvent(_)));
    }
}
