//! Repository for the `client_settings` table.

use recruitflow_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::client::{ClientSettings, UpdateClientSettings};

const COLUMNS: &str = "client_id, company_name, sender_name, reply_to_email, email_signature, \
    gdpr_footer_enabled, gdpr_consent_text, portal_url, auto_archive_months, \
    auto_delete_months, quiet_mode_until, created_at, updated_at";

/// Provides access to per-client settings.
pub struct ClientSettingsRepo;

impl ClientSettingsRepo {
    pub async fn get(pool: &PgPool, client_id: DbId) -> Result<Option<ClientSettings>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM client_settings WHERE client_id = $1");
        sqlx::query_as::<_, ClientSettings>(&query)
            .bind(client_id)
            .fetch_optional(pool)
            .await
    }

    /// Apply non-`None` fields. Returns `None` when the client has no
    /// settings row.
    pub async fn update(
        pool: &PgPool,
        client_id: DbId,
        input: &UpdateClientSettings,
    ) -> Result<Option<ClientSettings>, sqlx::Error> {
        let query = format!(
            "UPDATE client_settings SET
                company_name = COALESCE($2, company_name),
                sender_name = COALESCE($3, sender_name),
                reply_to_email = COALESCE($4, reply_to_email),
                email_signature = COALESCE($5, email_signature),
                gdpr_footer_enabled = COALESCE($6, gdpr_footer_enabled),
                gdpr_consent_text = COALESCE($7, gdpr_consent_text),
                portal_url = COALESCE($8, portal_url),
                auto_archive_months = COALESCE($9, auto_archive_months),
                auto_delete_months = COALESCE($10, auto_delete_months),
                updated_at = NOW()
             WHERE client_id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ClientSettings>(&query)
            .bind(client_id)
            .bind(&input.company_name)
            .bind(&input.sender_name)
            .bind(&input.reply_to_email)
            .bind(&input.email_signature)
            .bind(input.gdpr_footer_enabled)
            .bind(&input.gdpr_consent_text)
            .bind(&input.portal_url)
            .bind(input.auto_archive_months)
            .bind(input.auto_delete_months)
            .fetch_optional(pool)
            .await
    }

    /// Set or clear the client-wide quiet mode.
    pub async fn set_quiet_mode(
        pool: &PgPool,
        client_id: DbId,
        until: Option<Timestamp>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE client_settings SET quiet_mode_until = $2, updated_at = NOW() \
             WHERE client_id = $1",
        )
        .bind(client_id)
        .bind(until)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
