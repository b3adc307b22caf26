//! Repository for the `email_templates` table.

use recruitflow_core::types::DbId;
use sqlx::PgPool;

use crate::models::email_template::{CreateEmailTemplate, EmailTemplate, UpdateEmailTemplate};

const COLUMNS: &str = "id, client_id, slug, name, subject, body, recipient_type, is_active, \
    review_before_send, created_at, updated_at";

/// Provides CRUD operations for message templates.
pub struct EmailTemplateRepo;

impl EmailTemplateRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateEmailTemplate,
    ) -> Result<EmailTemplate, sqlx::Error> {
        let query = format!(
            "INSERT INTO email_templates \
                (client_id, slug, name, subject, body, recipient_type, review_before_send) \
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, 'applicant'), COALESCE($7, false)) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EmailTemplate>(&query)
            .bind(input.client_id)
            .bind(&input.slug)
            .bind(&input.name)
            .bind(&input.subject)
            .bind(&input.body)
            .bind(&input.recipient_type)
            .bind(input.review_before_send)
            .fetch_one(pool)
            .await
    }

    /// Look up a template by slug, active or not.
    pub async fn find_by_slug(
        pool: &PgPool,
        client_id: DbId,
        slug: &str,
    ) -> Result<Option<EmailTemplate>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM email_templates WHERE client_id = $1 AND slug = $2");
        sqlx::query_as::<_, EmailTemplate>(&query)
            .bind(client_id)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_for_client(
        pool: &PgPool,
        client_id: DbId,
    ) -> Result<Vec<EmailTemplate>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM email_templates WHERE client_id = $1 ORDER BY name");
        sqlx::query_as::<_, EmailTemplate>(&query)
            .bind(client_id)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        client_id: DbId,
        slug: &str,
        input: &UpdateEmailTemplate,
    ) -> Result<Option<EmailTemplate>, sqlx::Error> {
        let query = format!(
            "UPDATE email_templates SET
                name = COALESCE($3, name),
                subject = COALESCE($4, subject),
                body = COALESCE($5, body),
                recipient_type = COALESCE($6, recipient_type),
                is_active = COALESCE($7, is_active),
                review_before_send = COALESCE($8, review_before_send),
                updated_at = NOW()
             WHERE client_id = $1 AND slug = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EmailTemplate>(&query)
            .bind(client_id)
            .bind(slug)
            .bind(&input.name)
            .bind(&input.subject)
            .bind(&input.body)
            .bind(&input.recipient_type)
            .bind(input.is_active)
            .bind(input.review_before_send)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, client_id: DbId, slug: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM email_templates WHERE client_id = $1 AND slug = $2")
            .bind(client_id)
            .bind(slug)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
