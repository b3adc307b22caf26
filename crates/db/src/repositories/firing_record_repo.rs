//! Repository for the `firing_records` table.
//!
//! Records are insert-only. The unique constraint on the firing key is the
//! single concurrency guard of the engine.

use recruitflow_core::firing::FiringKey;
use recruitflow_core::types::{DbId, Timestamp};
use sqlx::{PgConnection, PgPool};

use crate::models::firing_record::FiringRecord;

const COLUMNS: &str =
    "id, client_id, rule_kind, rule_id, subject_type, subject_id, episode, fired_at";

/// Provides access to firing history.
pub struct FiringRecordRepo;

impl FiringRecordRepo {
    /// Insert the record for `key` unless one exists.
    ///
    /// Returns the new ID, or `None` when the key was already taken. A
    /// concurrent uncommitted insert of the same key blocks this call until
    /// that transaction finishes.
    pub async fn insert_if_absent(
        conn: &mut PgConnection,
        client_id: DbId,
        key: &FiringKey,
        fired_at: Timestamp,
    ) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO firing_records \
                (client_id, rule_kind, rule_id, subject_type, subject_id, episode, fired_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT ON CONSTRAINT uq_firing_records_rule_subject DO NOTHING \
             RETURNING id",
        )
        .bind(client_id)
        .bind(key.rule.kind.as_str())
        .bind(key.rule.id)
        .bind(key.subject.kind.as_str())
        .bind(key.subject.id)
        .bind(&key.episode)
        .bind(fired_at)
        .fetch_optional(&mut *conn)
        .await
    }

    /// Whether a record for `key` exists.
    pub async fn exists(pool: &PgPool, key: &FiringKey) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM firing_records \
             WHERE rule_kind = $1 AND rule_id = $2 AND subject_type = $3 \
               AND subject_id = $4 AND episode = $5)",
        )
        .bind(key.rule.kind.as_str())
        .bind(key.rule.id)
        .bind(key.subject.kind.as_str())
        .bind(key.subject.id)
        .bind(&key.episode)
        .fetch_one(pool)
        .await
    }

    /// All records of one rule, oldest first.
    pub async fn list_for_rule(
        pool: &PgPool,
        rule_kind: &str,
        rule_id: DbId,
    ) -> Result<Vec<FiringRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM firing_records \
             WHERE rule_kind = $1 AND rule_id = $2 \
             ORDER BY fired_at, id"
        );
        sqlx::query_as::<_, FiringRecord>(&query)
            .bind(rule_kind)
            .bind(rule_id)
            .fetch_all(pool)
            .await
    }
}
