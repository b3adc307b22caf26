//! Repository for the `applicants` table.
//!
//! The record store owns applicants; the engine reads snapshots and, for
//! retention, archives and deletes idle rows inside a caller transaction.

use recruitflow_core::pipeline::STATUS_NEW;
use recruitflow_core::types::{DbId, Timestamp};
use sqlx::{PgConnection, PgPool};

use crate::models::applicant::{ApplicantSnapshot, CreateApplicant};

/// Snapshot projection: applicant columns joined with the campaign.
const SNAPSHOT_SELECT: &str = "SELECT a.id, a.client_id, a.campaign_id, \
    c.name AS campaign_name, c.job_title, c.location, \
    a.first_name, a.last_name, a.email, a.status, a.previous_status, a.status_entered_at, \
    a.source, a.interview_at, a.start_date, a.is_talent_pool, a.attributes, a.archived_at, \
    a.created_at, a.updated_at \
    FROM applicants a LEFT JOIN campaigns c ON c.id = a.campaign_id";

/// Provides access to applicants.
pub struct ApplicantRepo;

impl ApplicantRepo {
    /// Insert an applicant, returning its snapshot.
    pub async fn create(
        pool: &PgPool,
        input: &CreateApplicant,
    ) -> Result<ApplicantSnapshot, sqlx::Error> {
        let id: DbId = sqlx::query_scalar(
            "INSERT INTO applicants \
                (client_id, campaign_id, first_name, last_name, email, status, source, \
                 interview_at, start_date) \
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, $7), $8, $9, $10) \
             RETURNING id",
        )
        .bind(input.client_id)
        .bind(input.campaign_id)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.email)
        .bind(&input.status)
        .bind(STATUS_NEW)
        .bind(&input.source)
        .bind(input.interview_at)
        .bind(input.start_date)
        .fetch_one(pool)
        .await?;

        Self::find_snapshot(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn find_snapshot(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<ApplicantSnapshot>, sqlx::Error> {
        let query = format!("{SNAPSHOT_SELECT} WHERE a.id = $1");
        sqlx::query_as::<_, ApplicantSnapshot>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Applicants of a client still in the active pipeline: not archived and
    /// not in one of `terminal_statuses`.
    pub async fn list_open(
        pool: &PgPool,
        client_id: DbId,
        terminal_statuses: &[&str],
    ) -> Result<Vec<ApplicantSnapshot>, sqlx::Error> {
        let terminal: Vec<String> = terminal_statuses.iter().map(|s| s.to_string()).collect();
        let query = format!(
            "{SNAPSHOT_SELECT} \
             WHERE a.client_id = $1 AND a.archived_at IS NULL AND NOT (a.status = ANY($2)) \
             ORDER BY a.id"
        );
        sqlx::query_as::<_, ApplicantSnapshot>(&query)
            .bind(client_id)
            .bind(terminal)
            .fetch_all(pool)
            .await
    }

    /// Move an applicant to `status`, remembering the previous one.
    ///
    /// Returns `None` when the applicant does not exist or already has the
    /// status (no transition happened).
    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        status: &str,
    ) -> Result<Option<ApplicantSnapshot>, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE applicants SET \
                previous_status = status, \
                status = $2, \
                status_entered_at = NOW(), \
                updated_at = NOW() \
             WHERE id = $1 AND status <> $2",
        )
        .bind(id)
        .bind(status)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Self::find_snapshot(pool, id).await
    }

    pub async fn set_interview(
        pool: &PgPool,
        id: DbId,
        interview_at: Option<Timestamp>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE applicants SET interview_at = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(interview_at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Archive applicants without activity since `cutoff`.
    ///
    /// Leaves `updated_at` untouched so idleness keeps counting towards the
    /// delete threshold.
    pub async fn archive_idle(
        conn: &mut PgConnection,
        client_id: DbId,
        cutoff: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE applicants SET archived_at = NOW() \
             WHERE client_id = $1 AND archived_at IS NULL AND updated_at < $2",
        )
        .bind(client_id)
        .bind(cutoff)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Permanently delete applicants without activity since `cutoff`.
    pub async fn delete_idle(
        conn: &mut PgConnection,
        client_id: DbId,
        cutoff: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM applicants WHERE client_id = $1 AND updated_at < $2")
            .bind(client_id)
            .bind(cutoff)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }
}
