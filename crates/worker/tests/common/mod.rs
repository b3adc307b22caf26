//! Shared fixtures for engine tests: an in-memory [`RuleStore`] and a
//! recording transport.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{FixedOffset, NaiveTime, Offset, TimeZone, Utc};
use recruitflow_core::firing::{FiringKey, RuleKind, RuleRef};
use recruitflow_core::pipeline::Pipeline;
use recruitflow_core::retention::RetentionPlan;
use recruitflow_core::subject::{SubjectContext, SubjectKind, SubjectRef};
use recruitflow_core::types::{DbId, Timestamp};
use recruitflow_db::models::applicant::PurgeReport;
use recruitflow_db::models::audit::NewAuditEntry;
use recruitflow_db::models::automation::Automation;
use recruitflow_db::models::client::ClientSettings;
use recruitflow_db::models::email_template::EmailTemplate;
use recruitflow_db::models::notification::NewNotification;
use recruitflow_db::models::reminder::Reminder;
use recruitflow_db::models::review_queue::NewReviewItem;
use recruitflow_events::{MessageTransport, OutboundMessage, RetryPolicy, TransportError};
use recruitflow_worker::store::NotificationTarget;
use recruitflow_worker::{Claim, Engine, EngineConfig, FiringClaim, RuleStore, StoreError};
use serde_json::Value;

pub const CLIENT: DbId = 1;

pub fn at(day: u32, hour: u32) -> Timestamp {
    Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap()
}

pub fn utc() -> FixedOffset {
    Utc.fix()
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryState {
    pub automations: Vec<Automation>,
    pub reminders: Vec<Reminder>,
    pub subjects: Vec<SubjectContext>,
    pub templates: Vec<EmailTemplate>,
    pub settings: HashMap<DbId, ClientSettings>,
    pub targets: Vec<(DbId, NotificationTarget)>,
    pub firings: HashSet<FiringKey>,
    pub reserved: HashSet<FiringKey>,
    pub notifications: Vec<NewNotification>,
    pub reviews: Vec<NewReviewItem>,
    pub audit: Vec<NewAuditEntry>,
    pub purges: Vec<(RuleRef, RetentionPlan)>,
    pub open_alerts: HashSet<RuleRef>,
    pub fail_purge: bool,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    pub state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut MemoryState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn firing_count(&self) -> usize {
        self.with(|s| s.firings.len())
    }
}

impl MemoryState {
    fn rule_active(&self, rule: RuleRef) -> bool {
        match rule.kind {
            RuleKind::Automation => self.automations.iter().any(|a| a.id == rule.id && a.is_active),
            RuleKind::Reminder => self.reminders.iter().any(|r| r.id == rule.id && r.is_active),
        }
    }

    fn touch(&mut self, rule: RuleRef, at: Timestamp) {
        match rule.kind {
            RuleKind::Automation => {
                if let Some(a) = self.automations.iter_mut().find(|a| a.id == rule.id) {
                    a.last_triggered_at = Some(at);
                }
            }
            RuleKind::Reminder => {
                if let Some(r) = self.reminders.iter_mut().find(|r| r.id == rule.id) {
                    r.last_triggered_at = Some(at);
                }
            }
        }
    }
}

pub struct MemoryClaim {
    state: Arc<Mutex<MemoryState>>,
    key: FiringKey,
    fired_at: Timestamp,
    notifications: Vec<NewNotification>,
    reviews: Vec<NewReviewItem>,
}

impl Drop for MemoryClaim {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.reserved.remove(&self.key);
        }
    }
}

#[async_trait]
impl FiringClaim for MemoryClaim {
    async fn insert_notification(&mut self, n: &NewNotification) -> Result<DbId, StoreError> {
        self.notifications.push(n.clone());
        Ok(self.notifications.len() as DbId)
    }

    async fn queue_for_review(&mut self, item: &NewReviewItem) -> Result<DbId, StoreError> {
        self.reviews.push(item.clone());
        Ok(self.reviews.len() as DbId)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.firings.insert(self.key.clone());
        state.notifications.extend(self.notifications.iter().cloned());
        state.reviews.extend(self.reviews.iter().cloned());
        state.touch(self.key.rule, self.fired_at);
        Ok(())
    }

    async fn release(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}

#[async_trait]
impl RuleStore for MemoryStore {
    async fn active_automations(&self) -> Result<Vec<Automation>, StoreError> {
        Ok(self.with(|s| s.automations.iter().filter(|a| a.is_active).cloned().collect()))
    }

    async fn active_automations_for_client(
        &self,
        client_id: DbId,
    ) -> Result<Vec<Automation>, StoreError> {
        Ok(self.with(|s| {
            s.automations
                .iter()
                .filter(|a| a.is_active && a.client_id == client_id)
                .cloned()
                .collect()
        }))
    }

    async fn active_reminders(&self) -> Result<Vec<Reminder>, StoreError> {
        Ok(self.with(|s| s.reminders.iter().filter(|r| r.is_active).cloned().collect()))
    }

    async fn pipeline(&self, _client_id: DbId) -> Result<Pipeline, StoreError> {
        Ok(Pipeline::default())
    }

    async fn client_settings(
        &self,
        client_id: DbId,
    ) -> Result<Option<ClientSettings>, StoreError> {
        Ok(self.with(|s| s.settings.get(&client_id).cloned()))
    }

    async fn open_subjects(&self, client_id: DbId) -> Result<Vec<SubjectContext>, StoreError> {
        Ok(self.with(|s| {
            s.subjects
                .iter()
                .filter(|c| c.client_id == client_id && c.subject.kind == SubjectKind::Applicant)
                .cloned()
                .collect()
        }))
    }

    async fn subject(&self, subject: SubjectRef) -> Result<Option<SubjectContext>, StoreError> {
        if subject.kind == SubjectKind::Client {
            return Ok(Some(SubjectContext::client_scope(subject.id, at(1, 0))));
        }
        Ok(self.with(|s| s.subjects.iter().find(|c| c.subject == subject).cloned()))
    }

    async fn template(
        &self,
        client_id: DbId,
        slug: &str,
    ) -> Result<Option<EmailTemplate>, StoreError> {
        Ok(self.with(|s| {
            s.templates
                .iter()
                .find(|t| t.client_id == client_id && t.slug == slug)
                .cloned()
        }))
    }

    async fn notification_targets(
        &self,
        client_id: DbId,
        _event_type: &str,
    ) -> Result<Vec<NotificationTarget>, StoreError> {
        Ok(self.with(|s| {
            s.targets
                .iter()
                .filter(|(c, _)| *c == client_id)
                .map(|(_, t)| t.clone())
                .collect()
        }))
    }

    async fn firing_history(&self, rule: RuleRef) -> Result<Vec<FiringKey>, StoreError> {
        Ok(self.with(|s| s.firings.iter().filter(|k| k.rule == rule).cloned().collect()))
    }

    async fn claim(
        &self,
        _client_id: DbId,
        key: &FiringKey,
        fired_at: Timestamp,
    ) -> Result<Claim, StoreError> {
        let mut state = self.state.lock().unwrap();
        if !state.rule_active(key.rule) {
            return Ok(Claim::RuleInactive);
        }
        if state.firings.contains(key) || !state.reserved.insert(key.clone()) {
            return Ok(Claim::AlreadyFired);
        }
        Ok(Claim::Claimed(Box::new(MemoryClaim {
            state: Arc::clone(&self.state),
            key: key.clone(),
            fired_at,
            notifications: Vec::new(),
            reviews: Vec::new(),
        })))
    }

    async fn purge(
        &self,
        _client_id: DbId,
        rule: RuleRef,
        plan: RetentionPlan,
        at: Timestamp,
    ) -> Result<Option<PurgeReport>, StoreError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_purge {
            return Err(StoreError::Unavailable("connection reset".to_string()));
        }
        if !state.rule_active(rule) {
            return Ok(None);
        }
        state.purges.push((rule, plan));
        state.touch(rule, at);
        Ok(Some(PurgeReport {
            archived: 2,
            deleted: 1,
        }))
    }

    async fn has_open_alert(&self, rule: RuleRef) -> Result<bool, StoreError> {
        Ok(self.with(|s| s.open_alerts.contains(&rule)))
    }

    async fn record_audit(&self, entry: NewAuditEntry) -> Result<(), StoreError> {
        self.with(|s| {
            if entry.requires_ack {
                if let (Some(kind), Some(id)) = (entry.rule_kind.as_deref(), entry.rule_id) {
                    if let Some(kind) = RuleKind::parse(kind) {
                        s.open_alerts.insert(RuleRef { kind, id });
                    }
                }
            }
            s.audit.push(entry);
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Records sent messages; can be told to fail.
#[derive(Default)]
pub struct RecordingTransport {
    pub sent: Mutex<Vec<OutboundMessage>>,
    pub attempts: AtomicU32,
    fail_transient: Mutex<bool>,
    delay: Option<Duration>,
}

impl RecordingTransport {
    pub fn failing() -> Self {
        Self {
            fail_transient: Mutex::new(true),
            ..Self::default()
        }
    }

    /// Each send takes `delay` before it succeeds.
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn recover(&self) {
        *self.fail_transient.lock().unwrap() = false;
    }

    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessageTransport for RecordingTransport {
    async fn send(&self, message: &OutboundMessage) -> Result<(), TransportError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if *self.fail_transient.lock().unwrap() {
            return Err(TransportError::Transient("451 try again later".to_string()));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

pub fn config() -> EngineConfig {
    EngineConfig {
        retry: RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
        },
        portal_base_url: "https://portal.test".to_string(),
        ..EngineConfig::default()
    }
}

pub fn engine(store: &MemoryStore, transport: &Arc<RecordingTransport>) -> Engine {
    let transport: Arc<dyn MessageTransport> = transport.clone();
    Engine::new(Arc::new(store.clone()), transport, &config())
}

pub fn automation(id: DbId, trigger_type: &str, trigger_config: Value) -> Automation {
    Automation {
        id,
        client_id: CLIENT,
        name: format!("Automation {id}"),
        description: None,
        trigger_type: trigger_type.to_string(),
        trigger_config,
        condition_config: None,
        action_type: "send_message".to_string(),
        action_config: serde_json::json!({"template_slug": "qualified"}),
        is_active: true,
        is_system: false,
        only_once_per_subject: true,
        send_window_start: None,
        send_window_end: None,
        last_triggered_at: None,
        created_at: at(1, 0),
        updated_at: at(1, 0),
    }
}

pub fn window(start: u32, end: u32) -> (Option<NaiveTime>, Option<NaiveTime>) {
    (
        NaiveTime::from_hms_opt(start, 0, 0),
        NaiveTime::from_hms_opt(end, 0, 0),
    )
}

pub fn reminder(id: DbId, status: &str, config: Value) -> Reminder {
    Reminder {
        id,
        client_id: CLIENT,
        slug: format!("reminder-{id}"),
        name: format!("Reminder {id}"),
        description: Some("Bitte nachfassen".to_string()),
        target_type: "applicant".to_string(),
        target_status: Some(status.to_string()),
        config,
        linked_template_slug: None,
        is_active: true,
        last_triggered_at: None,
        created_at: at(1, 0),
        updated_at: at(1, 0),
    }
}

pub fn template(slug: &str, review: bool) -> EmailTemplate {
    EmailTemplate {
        id: 1,
        client_id: CLIENT,
        slug: slug.to_string(),
        name: slug.to_string(),
        subject: "Hallo {{bewerber_vorname}}".to_string(),
        body: "Ihr Status: {{status}}. {{unbekannt}}".to_string(),
        recipient_type: "applicant".to_string(),
        is_active: true,
        review_before_send: review,
        created_at: at(1, 0),
        updated_at: at(1, 0),
    }
}

pub fn settings() -> ClientSettings {
    ClientSettings {
        client_id: CLIENT,
        company_name: Some("Acme Hotels".to_string()),
        sender_name: Some("Jonas Weber".to_string()),
        reply_to_email: Some("hr@acme.test".to_string()),
        email_signature: None,
        gdpr_footer_enabled: false,
        gdpr_consent_text: None,
        portal_url: None,
        auto_archive_months: 6,
        auto_delete_months: 12,
        quiet_mode_until: None,
        created_at: at(1, 0),
        updated_at: at(1, 0),
    }
}

/// An open applicant that entered `status` at `entered`.
pub fn applicant(id: DbId, status: &str, entered: Timestamp) -> SubjectContext {
    let mut subject = SubjectContext::applicant(CLIENT, id, at(1, 0));
    subject.first_name = Some("Anna".to_string());
    subject.last_name = Some("Berger".to_string());
    subject.email = Some(format!("applicant{id}@example.com"));
    subject.status = Some(status.to_string());
    subject.status_entered_at = Some(entered);
    subject
}
