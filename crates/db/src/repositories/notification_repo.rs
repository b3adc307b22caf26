//! Repository for the `notifications` table.

use recruitflow_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::notification::{DigestRecipient, NewNotification, Notification};

/// Column list for `notifications` queries.
const COLUMNS: &str = "id, client_id, user_id, event_type, title, body, link, channel, \
    subject_type, subject_id, is_read, read_at, is_delivered, delivered_at, created_at";

/// Provides access to portal notifications.
pub struct NotificationRepo;

impl NotificationRepo {
    /// Insert a notification inside the caller's transaction, returning its ID.
    pub async fn create(
        conn: &mut PgConnection,
        input: &NewNotification,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO notifications \
                (client_id, user_id, event_type, title, body, link, channel, \
                 subject_type, subject_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING id",
        )
        .bind(input.client_id)
        .bind(input.user_id)
        .bind(&input.event_type)
        .bind(&input.title)
        .bind(&input.body)
        .bind(&input.link)
        .bind(&input.channel)
        .bind(&input.subject_type)
        .bind(input.subject_id)
        .fetch_one(&mut *conn)
        .await
    }

    /// List notifications for a user, newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        limit: i64,
    ) -> Result<Vec<Notification>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notifications \
             WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(user_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    pub async fn count_for_client(pool: &PgPool, client_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE client_id = $1")
            .bind(client_id)
            .fetch_one(pool)
            .await
    }

    /// Users with undelivered rows on `channel`, with their address.
    /// Clients currently in quiet mode are left out.
    pub async fn pending_recipients(
        pool: &PgPool,
        channel: &str,
    ) -> Result<Vec<DigestRecipient>, sqlx::Error> {
        sqlx::query_as::<_, DigestRecipient>(
            "SELECT n.client_id, n.user_id, u.email, COUNT(*) AS pending \
             FROM notifications n \
             JOIN portal_users u ON u.id = n.user_id \
             LEFT JOIN client_settings s ON s.client_id = n.client_id \
             WHERE n.channel = $1 AND NOT n.is_delivered AND u.is_active \
               AND (s.quiet_mode_until IS NULL OR s.quiet_mode_until <= NOW()) \
             GROUP BY n.client_id, n.user_id, u.email \
             ORDER BY n.client_id, n.user_id",
        )
        .bind(channel)
        .fetch_all(pool)
        .await
    }

    /// Undelivered rows of one user on `channel`, oldest first.
    pub async fn list_pending_for_channel(
        pool: &PgPool,
        user_id: DbId,
        channel: &str,
    ) -> Result<Vec<Notification>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notifications \
             WHERE user_id = $1 AND channel = $2 AND NOT is_delivered \
             ORDER BY id"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(user_id)
            .bind(channel)
            .fetch_all(pool)
            .await
    }

    /// Mark rows up to and including `up_to_id` delivered, so rows written
    /// while a digest was being sent stay pending.
    pub async fn mark_channel_delivered(
        pool: &PgPool,
        user_id: DbId,
        channel: &str,
        up_to_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications \
             SET is_delivered = true, delivered_at = NOW() \
             WHERE user_id = $1 AND channel = $2 AND NOT is_delivered AND id <= $3",
        )
        .bind(user_id)
        .bind(channel)
        .bind(up_to_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
