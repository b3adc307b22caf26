//! Integration tests for the repositories the engine depends on.
//!
//! Exercises the repository layer against a real database to verify that:
//! - Firing records are unique per key, and a duplicate insert is a no-op
//! - System automations refuse edits and deletion but can be toggled
//! - Status updates remember the previous status
//! - Retention archives and deletes idle applicants only
//! - Digest bookkeeping respects the delivered high-water mark

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use recruitflow_core::channels::{CHANNEL_DIGEST, CHANNEL_IN_APP};
use recruitflow_core::firing::{FiringKey, RuleKind, RuleRef};
use recruitflow_core::notification::EmailMode;
use recruitflow_core::pipeline::{STATUS_NEW, STATUS_QUALIFIED};
use recruitflow_core::subject::SubjectRef;
use recruitflow_db::models::applicant::CreateApplicant;
use recruitflow_db::models::automation::{CreateAutomation, UpdateAutomation};
use recruitflow_db::models::client::{Client, CreateClient};
use recruitflow_db::models::notification::{NewNotification, UpsertPreference};
use recruitflow_db::models::portal_user::CreatePortalUser;
use recruitflow_db::models::review_queue::{NewReviewItem, REVIEW_REJECTED, REVIEW_SENT};
use recruitflow_db::repositories::automation_repo::Guarded;
use recruitflow_db::repositories::{
    ApplicantRepo, AutomationRepo, ClientRepo, ClientSettingsRepo, FiringRecordRepo,
    NotificationPreferenceRepo, NotificationRepo, PortalUserRepo, ReviewQueueRepo,
};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn new_client(pool: &PgPool, slug: &str) -> Client {
    ClientRepo::create(
        pool,
        &CreateClient {
            name: format!("Client {slug}"),
            slug: slug.to_string(),
        },
    )
    .await
    .unwrap()
}

fn new_automation(client_id: i64, is_system: bool) -> CreateAutomation {
    CreateAutomation {
        client_id,
        name: "Qualifiziert-Mail".to_string(),
        description: None,
        trigger_type: "status_change".to_string(),
        trigger_config: Some(serde_json::json!({"to_status": STATUS_QUALIFIED})),
        condition_config: None,
        action_type: "send_message".to_string(),
        action_config: Some(serde_json::json!({"template_slug": "qualified"})),
        is_active: None,
        is_system: Some(is_system),
        only_once_per_subject: None,
        send_window_start: None,
        send_window_end: None,
    }
}

fn key(rule_id: i64, subject_id: i64, episode: &str) -> FiringKey {
    FiringKey {
        rule: RuleRef {
            kind: RuleKind::Automation,
            id: rule_id,
        },
        subject: SubjectRef::applicant(subject_id),
        episode: episode.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Firing records
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn firing_record_insert_is_idempotent(pool: PgPool) {
    let client = new_client(&pool, "acme").await;
    let now = Utc::now();

    let mut conn = pool.acquire().await.unwrap();
    let first = FiringRecordRepo::insert_if_absent(&mut conn, client.id, &key(1, 7, ""), now)
        .await
        .unwrap();
    assert!(first.is_some());

    let second = FiringRecordRepo::insert_if_absent(&mut conn, client.id, &key(1, 7, ""), now)
        .await
        .unwrap();
    assert!(second.is_none(), "duplicate key must not insert");

    let other_episode =
        FiringRecordRepo::insert_if_absent(&mut conn, client.id, &key(1, 7, "second"), now)
            .await
            .unwrap();
    assert!(other_episode.is_some());

    assert!(FiringRecordRepo::exists(&pool, &key(1, 7, "")).await.unwrap());
    assert!(!FiringRecordRepo::exists(&pool, &key(1, 8, "")).await.unwrap());
    assert_eq!(
        FiringRecordRepo::list_for_rule(&pool, "automation", 1)
            .await
            .unwrap()
            .len(),
        2
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn rolled_back_firing_leaves_no_record(pool: PgPool) {
    let client = new_client(&pool, "acme").await;

    let mut tx = pool.begin().await.unwrap();
    FiringRecordRepo::insert_if_absent(&mut tx, client.id, &key(2, 7, ""), Utc::now())
        .await
        .unwrap();
    tx.rollback().await.unwrap();

    assert!(!FiringRecordRepo::exists(&pool, &key(2, 7, "")).await.unwrap());
}

// ---------------------------------------------------------------------------
// Automations
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn system_automations_are_toggle_only(pool: PgPool) {
    let client = new_client(&pool, "acme").await;
    let system = AutomationRepo::create(&pool, &new_automation(client.id, true))
        .await
        .unwrap();

    let edit = UpdateAutomation {
        name: Some("renamed".to_string()),
        ..Default::default()
    };
    assert_matches!(
        AutomationRepo::update(&pool, client.id, system.id, &edit).await.unwrap(),
        Guarded::SystemRule
    );
    assert_matches!(
        AutomationRepo::delete(&pool, client.id, system.id).await.unwrap(),
        Guarded::SystemRule
    );

    let toggled = AutomationRepo::set_active(&pool, client.id, system.id, false)
        .await
        .unwrap()
        .unwrap();
    assert!(!toggled.is_active);
    assert!(AutomationRepo::list_active(&pool).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn custom_automations_can_be_edited(pool: PgPool) {
    let client = new_client(&pool, "acme").await;
    let other = new_client(&pool, "globex").await;
    let rule = AutomationRepo::create(&pool, &new_automation(client.id, false))
        .await
        .unwrap();
    assert!(rule.only_once_per_subject);

    let edit = UpdateAutomation {
        name: Some("renamed".to_string()),
        ..Default::default()
    };
    assert_matches!(
        AutomationRepo::update(&pool, client.id, rule.id, &edit).await.unwrap(),
        Guarded::Applied(a) if a.name == "renamed"
    );
    assert_matches!(
        AutomationRepo::update(&pool, other.id, rule.id, &edit).await.unwrap(),
        Guarded::NotFound
    );
    assert_matches!(
        AutomationRepo::delete(&pool, client.id, rule.id).await.unwrap(),
        Guarded::Applied(())
    );
}

// ---------------------------------------------------------------------------
// Applicants
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn status_update_tracks_previous_status(pool: PgPool) {
    let client = new_client(&pool, "acme").await;
    let applicant = ApplicantRepo::create(
        &pool,
        &CreateApplicant {
            client_id: client.id,
            first_name: Some("Anna".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(applicant.status, STATUS_NEW);

    let moved = ApplicantRepo::update_status(&pool, applicant.id, STATUS_QUALIFIED)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(moved.status, STATUS_QUALIFIED);
    assert_eq!(moved.previous_status.as_deref(), Some(STATUS_NEW));

    let unchanged = ApplicantRepo::update_status(&pool, applicant.id, STATUS_QUALIFIED)
        .await
        .unwrap();
    assert!(unchanged.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn retention_only_touches_idle_applicants(pool: PgPool) {
    let client = new_client(&pool, "acme").await;
    let mut ids = Vec::new();
    for _ in 0..3 {
        let a = ApplicantRepo::create(
            &pool,
            &CreateApplicant {
                client_id: client.id,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        ids.push(a.id);
    }
    // Backdate: one idle for two years, one for eight months.
    for (id, days) in [(ids[0], 730), (ids[1], 240)] {
        sqlx::query("UPDATE applicants SET updated_at = NOW() - make_interval(days => $2) WHERE id = $1")
            .bind(id)
            .bind(days)
            .execute(&pool)
            .await
            .unwrap();
    }

    let now = Utc::now();
    let mut tx = pool.begin().await.unwrap();
    let archived = ApplicantRepo::archive_idle(&mut tx, client.id, now - Duration::days(180))
        .await
        .unwrap();
    let deleted = ApplicantRepo::delete_idle(&mut tx, client.id, now - Duration::days(365))
        .await
        .unwrap();
    tx.commit().await.unwrap();

    assert_eq!(archived, 2);
    assert_eq!(deleted, 1);
    assert!(ApplicantRepo::find_snapshot(&pool, ids[0]).await.unwrap().is_none());
    let kept = ApplicantRepo::find_snapshot(&pool, ids[1]).await.unwrap().unwrap();
    assert!(kept.archived_at.is_some());
    let fresh = ApplicantRepo::find_snapshot(&pool, ids[2]).await.unwrap().unwrap();
    assert!(fresh.archived_at.is_none());

    let open = ApplicantRepo::list_open(&pool, client.id, &[]).await.unwrap();
    assert_eq!(open.len(), 1);
}

// ---------------------------------------------------------------------------
// Notifications and review queue
// ---------------------------------------------------------------------------

fn notification(client_id: i64, user_id: i64, channel: &str) -> NewNotification {
    NewNotification {
        client_id,
        user_id,
        event_type: "reminder".to_string(),
        title: "CV fehlt".to_string(),
        body: None,
        link: None,
        channel: channel.to_string(),
        subject_type: Some("applicant".to_string()),
        subject_id: Some(1),
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn digest_rows_are_marked_up_to_watermark(pool: PgPool) {
    let client = new_client(&pool, "acme").await;
    let user = PortalUserRepo::create(
        &pool,
        &CreatePortalUser {
            client_id: client.id,
            email: "hr@acme.test".to_string(),
            display_name: None,
        },
    )
    .await
    .unwrap();

    let mut conn = pool.acquire().await.unwrap();
    let first = NotificationRepo::create(&mut conn, &notification(client.id, user.id, CHANNEL_DIGEST))
        .await
        .unwrap();
    NotificationRepo::create(&mut conn, &notification(client.id, user.id, CHANNEL_IN_APP))
        .await
        .unwrap();
    let later = NotificationRepo::create(&mut conn, &notification(client.id, user.id, CHANNEL_DIGEST))
        .await
        .unwrap();

    let recipients = NotificationRepo::pending_recipients(&pool, CHANNEL_DIGEST)
        .await
        .unwrap();
    assert_eq!(recipients.len(), 1);
    assert_eq!(recipients[0].pending, 2);
    assert_eq!(recipients[0].email, "hr@acme.test");

    let marked = NotificationRepo::mark_channel_delivered(&pool, user.id, CHANNEL_DIGEST, first)
        .await
        .unwrap();
    assert_eq!(marked, 1);
    let pending = NotificationRepo::list_pending_for_channel(&pool, user.id, CHANNEL_DIGEST)
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, later);

    ClientSettingsRepo::set_quiet_mode(&pool, client.id, Some(Utc::now() + Duration::days(1)))
        .await
        .unwrap();
    assert!(NotificationRepo::pending_recipients(&pool, CHANNEL_DIGEST)
        .await
        .unwrap()
        .is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn preferences_upsert_per_user_and_event(pool: PgPool) {
    let client = new_client(&pool, "acme").await;
    let user = PortalUserRepo::create(
        &pool,
        &CreatePortalUser {
            client_id: client.id,
            email: "hr@acme.test".to_string(),
            display_name: Some("HR".to_string()),
        },
    )
    .await
    .unwrap();

    let mut pref = UpsertPreference {
        client_id: client.id,
        user_id: user.id,
        event_type: "reminder".to_string(),
        portal_enabled: true,
        email_enabled: true,
        email_mode: EmailMode::Instant,
    };
    NotificationPreferenceRepo::upsert(&pool, &pref).await.unwrap();
    pref.email_mode = EmailMode::Digest;
    let stored = NotificationPreferenceRepo::upsert(&pool, &pref).await.unwrap();
    assert_eq!(stored.email_mode, "digest");

    let rows = NotificationPreferenceRepo::list_for_event_type(&pool, client.id, "reminder")
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].flags().email_mode, EmailMode::Digest);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn review_items_are_decided_once(pool: PgPool) {
    let client = new_client(&pool, "acme").await;
    let mut conn = pool.acquire().await.unwrap();
    let id = ReviewQueueRepo::create(
        &mut conn,
        &NewReviewItem {
            client_id: client.id,
            rule_kind: "automation".to_string(),
            rule_id: 1,
            template_slug: "qualified".to_string(),
            subject_type: "applicant".to_string(),
            subject_id: 7,
            recipient: "anna@example.test".to_string(),
            subject: "Hallo Anna".to_string(),
            body: "Willkommen".to_string(),
        },
    )
    .await
    .unwrap();

    assert_eq!(ReviewQueueRepo::list_pending(&pool, client.id).await.unwrap().len(), 1);
    let mut tx = pool.begin().await.unwrap();
    assert!(ReviewQueueRepo::lock_pending(&mut tx, id).await.unwrap().is_some());
    let decided = ReviewQueueRepo::decide(&mut tx, id, REVIEW_SENT).await.unwrap();
    assert_matches!(decided, Some(item) if item.status == REVIEW_SENT);
    tx.commit().await.unwrap();

    assert!(ReviewQueueRepo::decide(&mut conn, id, REVIEW_REJECTED)
        .await
        .unwrap()
        .is_none());
    assert!(ReviewQueueRepo::list_pending(&pool, client.id).await.unwrap().is_empty());
}
