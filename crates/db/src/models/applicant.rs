//! Applicant models.

use chrono::NaiveDate;
use recruitflow_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An applicant joined with its campaign, as the engine evaluates it.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ApplicantSnapshot {
    pub id: DbId,
    pub client_id: DbId,
    pub campaign_id: Option<DbId>,
    pub campaign_name: Option<String>,
    pub job_title: Option<String>,
    pub location: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub status: String,
    pub previous_status: Option<String>,
    pub status_entered_at: Timestamp,
    pub source: Option<String>,
    pub interview_at: Option<Timestamp>,
    pub start_date: Option<NaiveDate>,
    pub is_talent_pool: bool,
    pub attributes: serde_json::Value,
    pub archived_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating an applicant.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateApplicant {
    pub client_id: DbId,
    pub campaign_id: Option<DbId>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    /// Defaults to the first pipeline status.
    pub status: Option<String>,
    pub source: Option<String>,
    pub interview_at: Option<Timestamp>,
    pub start_date: Option<NaiveDate>,
}

/// Counts from one retention run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PurgeReport {
    pub archived: u64,
    pub deleted: u64,
}
