//! Operator audit log models.

use recruitflow_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

pub const OUTCOME_FIRED: &str = "fired";
pub const OUTCOME_QUEUED_FOR_REVIEW: &str = "queued_for_review";
pub const OUTCOME_SEND_FAILED: &str = "send_failed";
pub const OUTCOME_PURGED: &str = "purged";
pub const OUTCOME_PURGE_FAILED: &str = "purge_failed";

/// A row from the `automation_audit_log` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AuditEntry {
    pub id: DbId,
    pub client_id: DbId,
    pub rule_kind: Option<String>,
    pub rule_id: Option<DbId>,
    pub subject_type: Option<String>,
    pub subject_id: Option<DbId>,
    pub outcome: String,
    pub message: String,
    pub details: serde_json::Value,
    pub requires_ack: bool,
    pub acknowledged_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// Insert payload for an audit entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewAuditEntry {
    pub client_id: DbId,
    pub rule_kind: Option<String>,
    pub rule_id: Option<DbId>,
    pub subject_type: Option<String>,
    pub subject_id: Option<DbId>,
    pub outcome: &'static str,
    pub message: String,
    pub details: serde_json::Value,
    pub requires_ack: bool,
}
