//! Firing record models.

use recruitflow_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// Name of the uniqueness constraint guarding firing records.
pub const FIRING_RECORD_CONSTRAINT: &str = "uq_firing_records_rule_subject";

/// A row from the `firing_records` table. Rows are insert-only.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FiringRecord {
    pub id: DbId,
    pub client_id: DbId,
    pub rule_kind: String,
    pub rule_id: DbId,
    pub subject_type: String,
    pub subject_id: DbId,
    pub episode: String,
    pub fired_at: Timestamp,
}
