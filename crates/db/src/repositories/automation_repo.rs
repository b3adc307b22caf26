//! Repository for the `automations` table.
//!
//! System automations (`is_system = true`) can only be toggled: `update`
//! and `delete` filter them out and report "not applied".

use recruitflow_core::types::{DbId, Timestamp};
use sqlx::{PgConnection, PgPool};

use crate::models::automation::{Automation, CreateAutomation, UpdateAutomation};

const COLUMNS: &str = "id, client_id, name, description, trigger_type, trigger_config, \
    condition_config, action_type, action_config, is_active, is_system, only_once_per_subject, \
    send_window_start, send_window_end, last_triggered_at, created_at, updated_at";

/// Outcome of a write that system automations refuse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guarded<T> {
    Applied(T),
    NotFound,
    SystemRule,
}

/// Provides CRUD operations for automations.
pub struct AutomationRepo;

impl AutomationRepo {
    pub async fn create(pool: &PgPool, input: &CreateAutomation) -> Result<Automation, sqlx::Error> {
        let query = format!(
            "INSERT INTO automations \
                (client_id, name, description, trigger_type, trigger_config, condition_config, \
                 action_type, action_config, is_active, is_system, only_once_per_subject, \
                 send_window_start, send_window_end) \
             VALUES ($1, $2, $3, $4, COALESCE($5, '{{}}'::jsonb), $6, $7, \
                     COALESCE($8, '{{}}'::jsonb), COALESCE($9, true), COALESCE($10, false), \
                     COALESCE($11, true), $12, $13) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Automation>(&query)
            .bind(input.client_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.trigger_type)
            .bind(&input.trigger_config)
            .bind(&input.condition_config)
            .bind(&input.action_type)
            .bind(&input.action_config)
            .bind(input.is_active)
            .bind(input.is_system)
            .bind(input.only_once_per_subject)
            .bind(input.send_window_start)
            .bind(input.send_window_end)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        client_id: DbId,
        id: DbId,
    ) -> Result<Option<Automation>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM automations WHERE id = $1 AND client_id = $2");
        sqlx::query_as::<_, Automation>(&query)
            .bind(id)
            .bind(client_id)
            .fetch_optional(pool)
            .await
    }

    /// All automations of a client, active or not.
    pub async fn list_for_client(
        pool: &PgPool,
        client_id: DbId,
    ) -> Result<Vec<Automation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM automations WHERE client_id = $1 ORDER BY is_system DESC, name"
        );
        sqlx::query_as::<_, Automation>(&query)
            .bind(client_id)
            .fetch_all(pool)
            .await
    }

    /// Active automations of every active client.
    pub async fn list_active(pool: &PgPool) -> Result<Vec<Automation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM automations \
             WHERE is_active \
               AND client_id IN (SELECT id FROM clients WHERE is_active) \
             ORDER BY client_id, id"
        );
        sqlx::query_as::<_, Automation>(&query).fetch_all(pool).await
    }

    pub async fn list_active_for_client(
        pool: &PgPool,
        client_id: DbId,
    ) -> Result<Vec<Automation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM automations WHERE client_id = $1 AND is_active ORDER BY id"
        );
        sqlx::query_as::<_, Automation>(&query)
            .bind(client_id)
            .fetch_all(pool)
            .await
    }

    /// Re-read the active flag inside a firing transaction.
    ///
    /// `FOR KEY SHARE` keeps the row from being deleted while the firing is
    /// open. It does not conflict with the `last_triggered_at` update at
    /// commit, so overlapping firings of one rule cannot deadlock.
    pub async fn is_active_locked(conn: &mut PgConnection, id: DbId) -> Result<bool, sqlx::Error> {
        let active: Option<bool> =
            sqlx::query_scalar("SELECT is_active FROM automations WHERE id = $1 FOR KEY SHARE")
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?;
        Ok(active.unwrap_or(false))
    }

    /// Apply non-`None` fields to a non-system automation.
    pub async fn update(
        pool: &PgPool,
        client_id: DbId,
        id: DbId,
        input: &UpdateAutomation,
    ) -> Result<Guarded<Automation>, sqlx::Error> {
        let query = format!(
            "UPDATE automations SET
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                trigger_type = COALESCE($5, trigger_type),
                trigger_config = COALESCE($6, trigger_config),
                condition_config = COALESCE($7, condition_config),
                action_type = COALESCE($8, action_type),
                action_config = COALESCE($9, action_config),
                only_once_per_subject = COALESCE($10, only_once_per_subject),
                send_window_start = COALESCE($11, send_window_start),
                send_window_end = COALESCE($12, send_window_end),
                updated_at = NOW()
             WHERE id = $1 AND client_id = $2 AND is_system = false
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Automation>(&query)
            .bind(id)
            .bind(client_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.trigger_type)
            .bind(&input.trigger_config)
            .bind(&input.condition_config)
            .bind(&input.action_type)
            .bind(&input.action_config)
            .bind(input.only_once_per_subject)
            .bind(input.send_window_start)
            .bind(input.send_window_end)
            .fetch_optional(pool)
            .await?;

        match updated {
            Some(row) => Ok(Guarded::Applied(row)),
            None => Self::classify_miss(pool, client_id, id).await,
        }
    }

    /// Activate or deactivate. Allowed for system automations.
    pub async fn set_active(
        pool: &PgPool,
        client_id: DbId,
        id: DbId,
        is_active: bool,
    ) -> Result<Option<Automation>, sqlx::Error> {
        let query = format!(
            "UPDATE automations SET is_active = $3, updated_at = NOW() \
             WHERE id = $1 AND client_id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Automation>(&query)
            .bind(id)
            .bind(client_id)
            .bind(is_active)
            .fetch_optional(pool)
            .await
    }

    /// Delete a non-system automation.
    pub async fn delete(
        pool: &PgPool,
        client_id: DbId,
        id: DbId,
    ) -> Result<Guarded<()>, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM automations WHERE id = $1 AND client_id = $2 AND is_system = false",
        )
        .bind(id)
        .bind(client_id)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(Guarded::Applied(()));
        }
        Self::classify_miss(pool, client_id, id).await
    }

    /// Advisory checkpoint, written in the firing transaction.
    pub async fn touch_last_triggered(
        conn: &mut PgConnection,
        id: DbId,
        at: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE automations SET last_triggered_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    async fn classify_miss<T>(
        pool: &PgPool,
        client_id: DbId,
        id: DbId,
    ) -> Result<Guarded<T>, sqlx::Error> {
        let is_system: Option<bool> = sqlx::query_scalar(
            "SELECT is_system FROM automations WHERE id = $1 AND client_id = $2",
        )
        .bind(id)
        .bind(client_id)
        .fetch_optional(pool)
        .await?;
        Ok(match is_system {
            Some(true) => Guarded::SystemRule,
            _ => Guarded::NotFound,
        })
    }
}
