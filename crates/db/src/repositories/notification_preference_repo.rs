//! Repository for the `notification_preferences` table.

use recruitflow_core::types::DbId;
use sqlx::PgPool;

use crate::models::notification::{NotificationPreference, UpsertPreference};

const COLUMNS: &str = "id, client_id, user_id, event_type, portal_enabled, email_enabled, \
    email_mode, created_at, updated_at";

/// Provides access to per-user notification preferences.
pub struct NotificationPreferenceRepo;

impl NotificationPreferenceRepo {
    /// Insert or update a preference.
    ///
    /// Uses `INSERT ... ON CONFLICT (user_id, event_type) DO UPDATE` to
    /// upsert in a single round-trip.
    pub async fn upsert(
        pool: &PgPool,
        input: &UpsertPreference,
    ) -> Result<NotificationPreference, sqlx::Error> {
        let query = format!(
            "INSERT INTO notification_preferences \
                (client_id, user_id, event_type, portal_enabled, email_enabled, email_mode) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (user_id, event_type) DO UPDATE SET \
                portal_enabled = EXCLUDED.portal_enabled, \
                email_enabled = EXCLUDED.email_enabled, \
                email_mode = EXCLUDED.email_mode, \
                updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, NotificationPreference>(&query)
            .bind(input.client_id)
            .bind(input.user_id)
            .bind(&input.event_type)
            .bind(input.portal_enabled)
            .bind(input.email_enabled)
            .bind(input.email_mode.as_str())
            .fetch_one(pool)
            .await
    }

    /// Every user's preference for one event type of a client. Users
    /// without a row are absent.
    pub async fn list_for_event_type(
        pool: &PgPool,
        client_id: DbId,
        event_type: &str,
    ) -> Result<Vec<NotificationPreference>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notification_preferences \
             WHERE client_id = $1 AND event_type = $2 \
             ORDER BY user_id"
        );
        sqlx::query_as::<_, NotificationPreference>(&query)
            .bind(client_id)
            .bind(event_type)
            .fetch_all(pool)
            .await
    }

    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<NotificationPreference>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notification_preferences WHERE user_id = $1 ORDER BY event_type"
        );
        sqlx::query_as::<_, NotificationPreference>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }
}
