//! Repository for the `review_queue` table.

use recruitflow_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::review_queue::{NewReviewItem, ReviewItem, REVIEW_PENDING};

const COLUMNS: &str = "id, client_id, rule_kind, rule_id, template_slug, subject_type, \
    subject_id, recipient, subject, body, status, decided_at, created_at";

/// Provides access to messages held for manual approval.
pub struct ReviewQueueRepo;

impl ReviewQueueRepo {
    /// Queue a rendered message inside the caller's transaction.
    pub async fn create(conn: &mut PgConnection, input: &NewReviewItem) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO review_queue \
                (client_id, rule_kind, rule_id, template_slug, subject_type, subject_id, \
                 recipient, subject, body) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING id",
        )
        .bind(input.client_id)
        .bind(&input.rule_kind)
        .bind(input.rule_id)
        .bind(&input.template_slug)
        .bind(&input.subject_type)
        .bind(input.subject_id)
        .bind(&input.recipient)
        .bind(&input.subject)
        .bind(&input.body)
        .fetch_one(&mut *conn)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ReviewItem>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM review_queue WHERE id = $1");
        sqlx::query_as::<_, ReviewItem>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_pending(pool: &PgPool, client_id: DbId) -> Result<Vec<ReviewItem>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM review_queue \
             WHERE client_id = $1 AND status = 'pending' \
             ORDER BY created_at, id"
        );
        sqlx::query_as::<_, ReviewItem>(&query)
            .bind(client_id)
            .fetch_all(pool)
            .await
    }

    /// Lock a pending item until the caller's transaction ends, so that a
    /// decision and its side effect happen once.
    ///
    /// Returns `None` when the item does not exist or was already decided.
    pub async fn lock_pending(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<ReviewItem>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM review_queue WHERE id = $1 AND status = $2 FOR UPDATE"
        );
        sqlx::query_as::<_, ReviewItem>(&query)
            .bind(id)
            .bind(REVIEW_PENDING)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Record a decision on a pending item.
    ///
    /// Returns `None` when the item does not exist or was already decided.
    pub async fn decide(
        conn: &mut PgConnection,
        id: DbId,
        status: &str,
    ) -> Result<Option<ReviewItem>, sqlx::Error> {
        let query = format!(
            "UPDATE review_queue SET status = $2, decided_at = NOW() \
             WHERE id = $1 AND status = $3 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ReviewItem>(&query)
            .bind(id)
            .bind(status)
            .bind(REVIEW_PENDING)
            .fetch_optional(&mut *conn)
            .await
    }
}
