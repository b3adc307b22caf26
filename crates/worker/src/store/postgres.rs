//! [`RuleStore`] on PostgreSQL, built from the repositories of
//! `recruitflow-db`.

use async_trait::async_trait;
use recruitflow_core::firing::{FiringKey, RuleKind, RuleRef};
use recruitflow_core::pipeline::{Pipeline, TERMINAL_STATUSES};
use recruitflow_core::retention::RetentionPlan;
use recruitflow_core::subject::{SubjectContext, SubjectKind, SubjectRef};
use recruitflow_core::types::{DbId, Timestamp};
use recruitflow_db::models::applicant::{ApplicantSnapshot, PurgeReport};
use recruitflow_db::models::audit::NewAuditEntry;
use recruitflow_db::models::automation::Automation;
use recruitflow_db::models::client::ClientSettings;
use recruitflow_db::models::email_template::EmailTemplate;
use recruitflow_db::models::notification::NewNotification;
use recruitflow_db::models::reminder::Reminder;
use recruitflow_db::models::review_queue::NewReviewItem;
use recruitflow_db::repositories::{
    ApplicantRepo, AuditLogRepo, AutomationRepo, ClientSettingsRepo, EmailTemplateRepo,
    FiringRecordRepo, NotificationPreferenceRepo, NotificationRepo, PipelineStatusRepo,
    PortalUserRepo, ReminderRepo, ReviewQueueRepo,
};
use recruitflow_db::DbPool;
use sqlx::{PgConnection, Postgres, Transaction};

use super::{Claim, FiringClaim, NotificationTarget, RuleStore, StoreError};

#[derive(Clone)]
pub struct PgRuleStore {
    pool: DbPool,
}

impl PgRuleStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Lock the rule row and report whether it is still active.
async fn rule_is_active(conn: &mut PgConnection, rule: RuleRef) -> Result<bool, sqlx::Error> {
    match rule.kind {
        RuleKind::Automation => AutomationRepo::is_active_locked(conn, rule.id).await,
        RuleKind::Reminder => ReminderRepo::is_active_locked(conn, rule.id).await,
    }
}

async fn touch_rule(conn: &mut PgConnection, rule: RuleRef, at: Timestamp) -> Result<(), sqlx::Error> {
    match rule.kind {
        RuleKind::Automation => AutomationRepo::touch_last_triggered(conn, rule.id, at).await,
        RuleKind::Reminder => ReminderRepo::touch_last_triggered(conn, rule.id, at).await,
    }
}

/// Convert a stored applicant into the engine's snapshot type.
pub fn subject_from_snapshot(row: ApplicantSnapshot) -> SubjectContext {
    let mut subject = SubjectContext::applicant(row.client_id, row.id, row.created_at)
        .with_status(row.status, row.status_entered_at);
    subject.previous_status = row.previous_status;
    subject.first_name = row.first_name;
    subject.last_name = row.last_name;
    subject.email = row.email;
    subject.job_title = row.job_title;
    subject.campaign_id = row.campaign_id;
    subject.campaign_name = row.campaign_name;
    subject.location = row.location;
    subject.source = row.source;
    subject.interview_at = row.interview_at;
    subject.start_date = row.start_date;
    subject.is_talent_pool = row.is_talent_pool;
    if let serde_json::Value::Object(extra) = row.attributes {
        subject.extra = extra;
    }
    subject
}

#[async_trait]
impl RuleStore for PgRuleStore {
    async fn active_automations(&self) -> Result<Vec<Automation>, StoreError> {
        Ok(AutomationRepo::list_active(&self.pool).await?)
    }

    async fn active_automations_for_client(
        &self,
        client_id: DbId,
    ) -> Result<Vec<Automation>, StoreError> {
        Ok(AutomationRepo::list_active_for_client(&self.pool, client_id).await?)
    }

    async fn active_reminders(&self) -> Result<Vec<Reminder>, StoreError> {
        Ok(ReminderRepo::list_active(&self.pool).await?)
    }

    async fn pipeline(&self, client_id: DbId) -> Result<Pipeline, StoreError> {
        let names = PipelineStatusRepo::list_names(&self.pool, client_id).await?;
        Ok(Pipeline::from_statuses(names))
    }

    async fn client_settings(
        &self,
        client_id: DbId,
    ) -> Result<Option<ClientSettings>, StoreError> {
        Ok(ClientSettingsRepo::get(&self.pool, client_id).await?)
    }

    async fn open_subjects(&self, client_id: DbId) -> Result<Vec<SubjectContext>, StoreError> {
        let rows = ApplicantRepo::list_open(&self.pool, client_id, TERMINAL_STATUSES).await?;
        Ok(rows.into_iter().map(subject_from_snapshot).collect())
    }

    async fn subject(&self, subject: SubjectRef) -> Result<Option<SubjectContext>, StoreError> {
        match subject.kind {
            SubjectKind::Applicant => Ok(ApplicantRepo::find_snapshot(&self.pool, subject.id)
                .await?
                .map(subject_from_snapshot)),
            SubjectKind::Client => Ok(ClientSettingsRepo::get(&self.pool, subject.id)
                .await?
                .map(|s| SubjectContext::client_scope(s.client_id, s.created_at))),
            SubjectKind::Campaign => Ok(None),
        }
    }

    async fn template(
        &self,
        client_id: DbId,
        slug: &str,
    ) -> Result<Option<EmailTemplate>, StoreError> {
        Ok(EmailTemplateRepo::find_by_slug(&self.pool, client_id, slug).await?)
    }

    async fn notification_targets(
        &self,
        client_id: DbId,
        event_type: &str,
    ) -> Result<Vec<NotificationTarget>, StoreError> {
        let users = PortalUserRepo::list_active(&self.pool, client_id).await?;
        let preferences =
            NotificationPreferenceRepo::list_for_event_type(&self.pool, client_id, event_type)
                .await?;

        Ok(users
            .into_iter()
            .map(|user| NotificationTarget {
                preference: preferences
                    .iter()
                    .find(|p| p.user_id == user.id)
                    .map(|p| p.flags()),
                user_id: user.id,
                email: user.email,
            })
            .collect())
    }

    async fn firing_history(&self, rule: RuleRef) -> Result<Vec<FiringKey>, StoreError> {
        let records = FiringRecordRepo::list_for_rule(&self.pool, rule.kind.as_str(), rule.id).await?;
        Ok(records
            .into_iter()
            .filter_map(|r| {
                let kind = SubjectKind::parse(&r.subject_type)?;
                Some(FiringKey {
                    rule,
                    subject: SubjectRef {
                        kind,
                        id: r.subject_id,
                    },
                    episode: r.episode,
                })
            })
            .collect())
    }

    async fn claim(
        &self,
        client_id: DbId,
        key: &FiringKey,
        fired_at: Timestamp,
    ) -> Result<Claim, StoreError> {
        let mut tx = self.pool.begin().await?;

        if !rule_is_active(&mut tx, key.rule).await? {
            tx.rollback().await?;
            return Ok(Claim::RuleInactive);
        }

        match FiringRecordRepo::insert_if_absent(&mut tx, client_id, key, fired_at).await? {
            Some(_) => Ok(Claim::Claimed(Box::new(PgFiringClaim {
                tx,
                rule: key.rule,
                fired_at,
            }))),
            None => {
                tx.rollback().await?;
                Ok(Claim::AlreadyFired)
            }
        }
    }

    async fn purge(
        &self,
        client_id: DbId,
        rule: RuleRef,
        plan: RetentionPlan,
        at: Timestamp,
    ) -> Result<Option<PurgeReport>, StoreError> {
        let mut tx = self.pool.begin().await?;

        if !rule_is_active(&mut tx, rule).await? {
            tx.rollback().await?;
            return Ok(None);
        }

        let mut report = PurgeReport::default();
        if let Some(cutoff) = plan.archive_before {
            report.archived = ApplicantRepo::archive_idle(&mut tx, client_id, cutoff).await?;
        }
        if let Some(cutoff) = plan.delete_before {
            report.deleted = ApplicantRepo::delete_idle(&mut tx, client_id, cutoff).await?;
        }
        touch_rule(&mut tx, rule, at).await?;
        tx.commit().await?;

        Ok(Some(report))
    }

    async fn has_open_alert(&self, rule: RuleRef) -> Result<bool, StoreError> {
        Ok(AuditLogRepo::has_open_alert(&self.pool, rule.kind.as_str(), rule.id).await?)
    }

    async fn record_audit(&self, entry: NewAuditEntry) -> Result<(), StoreError> {
        AuditLogRepo::create(&self.pool, &entry).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Claim
// ---------------------------------------------------------------------------

/// A firing transaction holding the uncommitted firing record.
struct PgFiringClaim {
    tx: Transaction<'static, Postgres>,
    rule: RuleRef,
    fired_at: Timestamp,
}

#[async_trait]
impl FiringClaim for PgFiringClaim {
    async fn insert_notification(
        &mut self,
        notification: &NewNotification,
    ) -> Result<DbId, StoreError> {
        Ok(NotificationRepo::create(&mut self.tx, notification).await?)
    }

    async fn queue_for_review(&mut self, item: &NewReviewItem) -> Result<DbId, StoreError> {
        Ok(ReviewQueueRepo::create(&mut self.tx, item).await?)
    }

    async fn commit(mut self: Box<Self>) -> Result<(), StoreError> {
        touch_rule(&mut self.tx, self.rule, self.fired_at).await?;
        self.tx.commit().await?;
        Ok(())
    }

    async fn release(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
