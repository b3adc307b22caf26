//! Repository for the `automation_audit_log` table.

use recruitflow_core::types::DbId;
use sqlx::PgPool;

use crate::models::audit::{AuditEntry, NewAuditEntry};

const COLUMNS: &str = "id, client_id, rule_kind, rule_id, subject_type, subject_id, outcome, \
    message, details, requires_ack, acknowledged_at, created_at";

/// Provides access to the operator-facing audit log.
pub struct AuditLogRepo;

impl AuditLogRepo {
    pub async fn create(pool: &PgPool, input: &NewAuditEntry) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO automation_audit_log \
                (client_id, rule_kind, rule_id, subject_type, subject_id, outcome, message, \
                 details, requires_ack) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING id",
        )
        .bind(input.client_id)
        .bind(&input.rule_kind)
        .bind(input.rule_id)
        .bind(&input.subject_type)
        .bind(input.subject_id)
        .bind(input.outcome)
        .bind(&input.message)
        .bind(&input.details)
        .bind(input.requires_ack)
        .fetch_one(pool)
        .await
    }

    pub async fn list_for_client(
        pool: &PgPool,
        client_id: DbId,
        limit: i64,
    ) -> Result<Vec<AuditEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM automation_audit_log \
             WHERE client_id = $1 \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2"
        );
        sqlx::query_as::<_, AuditEntry>(&query)
            .bind(client_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Whether the rule has an alert no operator acknowledged yet.
    pub async fn has_open_alert(
        pool: &PgPool,
        rule_kind: &str,
        rule_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM automation_audit_log \
             WHERE rule_kind = $1 AND rule_id = $2 \
               AND requires_ack AND acknowledged_at IS NULL)",
        )
        .bind(rule_kind)
        .bind(rule_id)
        .fetch_one(pool)
        .await
    }

    /// Acknowledge an alert. Returns `false` when it was not open.
    pub async fn acknowledge(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE automation_audit_log SET acknowledged_at = NOW() \
             WHERE id = $1 AND requires_ack AND acknowledged_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
