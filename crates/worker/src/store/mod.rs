//! Persistence seam of the engine.
//!
//! The engine never touches SQL directly: everything it reads or writes
//! goes through [`RuleStore`]. [`postgres::PgRuleStore`] is the production
//! implementation; tests use an in-memory one.
//!
//! Firing is a two-step protocol. [`RuleStore::claim`] reserves the firing
//! key and re-checks that the rule is still active; the returned
//! [`FiringClaim`] collects the writes that belong to the firing and either
//! commits them together with the firing record or discards everything.

use async_trait::async_trait;
use recruitflow_core::firing::{FiringKey, RuleRef};
use recruitflow_core::notification::PreferenceFlags;
use recruitflow_core::pipeline::Pipeline;
use recruitflow_core::retention::RetentionPlan;
use recruitflow_core::subject::{SubjectContext, SubjectRef};
use recruitflow_core::types::{DbId, Timestamp};
use recruitflow_db::models::applicant::PurgeReport;
use recruitflow_db::models::audit::NewAuditEntry;
use recruitflow_db::models::automation::Automation;
use recruitflow_db::models::client::ClientSettings;
use recruitflow_db::models::email_template::EmailTemplate;
use recruitflow_db::models::notification::NewNotification;
use recruitflow_db::models::reminder::Reminder;
use recruitflow_db::models::review_queue::NewReviewItem;

pub mod postgres;

pub use postgres::PgRuleStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// A portal user who may receive a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationTarget {
    pub user_id: DbId,
    pub email: String,
    /// `None` when the user has no preference row for the event type.
    pub preference: Option<PreferenceFlags>,
}

/// Result of trying to reserve a firing key.
pub enum Claim {
    /// The key is reserved until the claim is committed or released.
    Claimed(Box<dyn FiringClaim>),
    /// A record for the key exists; somebody else already fired.
    AlreadyFired,
    /// The rule was deactivated or deleted since it was loaded.
    RuleInactive,
}

impl std::fmt::Debug for Claim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Claimed(_) => f.write_str("Claimed"),
            Self::AlreadyFired => f.write_str("AlreadyFired"),
            Self::RuleInactive => f.write_str("RuleInactive"),
        }
    }
}

/// Writes bound to one firing. Nothing is visible to others before
/// [`commit`](FiringClaim::commit); dropping the claim discards it.
#[async_trait]
pub trait FiringClaim: Send {
    async fn insert_notification(&mut self, notification: &NewNotification)
        -> Result<DbId, StoreError>;

    async fn queue_for_review(&mut self, item: &NewReviewItem) -> Result<DbId, StoreError>;

    /// Persist the firing record, the collected writes, and the rule's
    /// `last_triggered_at` atomically.
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    /// Discard the claim; the key becomes available again.
    async fn release(self: Box<Self>) -> Result<(), StoreError>;
}

#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Active automations of every active client.
    async fn active_automations(&self) -> Result<Vec<Automation>, StoreError>;

    async fn active_automations_for_client(
        &self,
        client_id: DbId,
    ) -> Result<Vec<Automation>, StoreError>;

    /// Active reminders of every active client.
    async fn active_reminders(&self) -> Result<Vec<Reminder>, StoreError>;

    async fn pipeline(&self, client_id: DbId) -> Result<Pipeline, StoreError>;

    async fn client_settings(&self, client_id: DbId)
        -> Result<Option<ClientSettings>, StoreError>;

    /// Applicants of a client that are neither archived nor in a terminal
    /// status.
    async fn open_subjects(&self, client_id: DbId) -> Result<Vec<SubjectContext>, StoreError>;

    async fn subject(&self, subject: SubjectRef) -> Result<Option<SubjectContext>, StoreError>;

    async fn template(
        &self,
        client_id: DbId,
        slug: &str,
    ) -> Result<Option<EmailTemplate>, StoreError>;

    /// Active portal users of a client with their preference for
    /// `event_type`.
    async fn notification_targets(
        &self,
        client_id: DbId,
        event_type: &str,
    ) -> Result<Vec<NotificationTarget>, StoreError>;

    /// Every firing key recorded for `rule`.
    async fn firing_history(&self, rule: RuleRef) -> Result<Vec<FiringKey>, StoreError>;

    /// Reserve `key` for a firing at `fired_at`.
    async fn claim(
        &self,
        client_id: DbId,
        key: &FiringKey,
        fired_at: Timestamp,
    ) -> Result<Claim, StoreError>;

    /// Apply a retention plan in one transaction. Returns `None` when the
    /// rule is no longer active.
    async fn purge(
        &self,
        client_id: DbId,
        rule: RuleRef,
        plan: RetentionPlan,
        at: Timestamp,
    ) -> Result<Option<PurgeReport>, StoreError>;

    /// Whether the rule has an unacknowledged operator alert.
    async fn has_open_alert(&self, rule: RuleRef) -> Result<bool, StoreError>;

    async fn record_audit(&self, entry: NewAuditEntry) -> Result<(), StoreError>;
}
