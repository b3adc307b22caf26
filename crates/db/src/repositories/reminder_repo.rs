//! Repository for the `reminders` table.

use recruitflow_core::types::{DbId, Timestamp};
use sqlx::{PgConnection, PgPool};

use crate::models::reminder::{CreateReminder, Reminder, UpdateReminder};

const COLUMNS: &str = "id, client_id, slug, name, description, target_type, target_status, \
    config, linked_template_slug, is_active, last_triggered_at, created_at, updated_at";

/// Provides CRUD operations for reminders.
pub struct ReminderRepo;

impl ReminderRepo {
    pub async fn create(pool: &PgPool, input: &CreateReminder) -> Result<Reminder, sqlx::Error> {
        let query = format!(
            "INSERT INTO reminders \
                (client_id, slug, name, description, target_status, config, \
                 linked_template_slug, is_active) \
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, '{{}}'::jsonb), $7, COALESCE($8, true)) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Reminder>(&query)
            .bind(input.client_id)
            .bind(&input.slug)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.target_status)
            .bind(&input.config)
            .bind(&input.linked_template_slug)
            .bind(input.is_active)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        client_id: DbId,
        id: DbId,
    ) -> Result<Option<Reminder>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM reminders WHERE id = $1 AND client_id = $2");
        sqlx::query_as::<_, Reminder>(&query)
            .bind(id)
            .bind(client_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_for_client(pool: &PgPool, client_id: DbId) -> Result<Vec<Reminder>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM reminders WHERE client_id = $1 ORDER BY name");
        sqlx::query_as::<_, Reminder>(&query)
            .bind(client_id)
            .fetch_all(pool)
            .await
    }

    /// Active reminders of every active client.
    pub async fn list_active(pool: &PgPool) -> Result<Vec<Reminder>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM reminders \
             WHERE is_active \
               AND client_id IN (SELECT id FROM clients WHERE is_active) \
             ORDER BY client_id, id"
        );
        sqlx::query_as::<_, Reminder>(&query).fetch_all(pool).await
    }

    /// See [`AutomationRepo::is_active_locked`](super::AutomationRepo::is_active_locked).
    pub async fn is_active_locked(conn: &mut PgConnection, id: DbId) -> Result<bool, sqlx::Error> {
        let active: Option<bool> =
            sqlx::query_scalar("SELECT is_active FROM reminders WHERE id = $1 FOR KEY SHARE")
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?;
        Ok(active.unwrap_or(false))
    }

    pub async fn update(
        pool: &PgPool,
        client_id: DbId,
        id: DbId,
        input: &UpdateReminder,
    ) -> Result<Option<Reminder>, sqlx::Error> {
        let query = format!(
            "UPDATE reminders SET
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                target_status = COALESCE($5, target_status),
                config = COALESCE($6, config),
                linked_template_slug = COALESCE($7, linked_template_slug),
                updated_at = NOW()
             WHERE id = $1 AND client_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Reminder>(&query)
            .bind(id)
            .bind(client_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.target_status)
            .bind(&input.config)
            .bind(&input.linked_template_slug)
            .fetch_optional(pool)
            .await
    }

    pub async fn set_active(
        pool: &PgPool,
        client_id: DbId,
        id: DbId,
        is_active: bool,
    ) -> Result<Option<Reminder>, sqlx::Error> {
        let query = format!(
            "UPDATE reminders SET is_active = $3, updated_at = NOW() \
             WHERE id = $1 AND client_id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Reminder>(&query)
            .bind(id)
            .bind(client_id)
            .bind(is_active)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, client_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM reminders WHERE id = $1 AND client_id = $2")
            .bind(id)
            .bind(client_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn touch_last_triggered(
        conn: &mut PgConnection,
        id: DbId,
        at: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE reminders SET last_triggered_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}
