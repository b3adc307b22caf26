//! Subjects: the entities a rule is evaluated against.
//!
//! The record store owns applicants, campaigns, and clients. The engine only
//! ever sees a read-only [`SubjectContext`] snapshot assembled by the store.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::condition::FieldValue;
use crate::types::{DbId, Timestamp};

const SECONDS_PER_DAY: i64 = 86_400;

/// Kind of entity a rule acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    Applicant,
    Campaign,
    /// Client-wide scope, used by schedule-only rules.
    Client,
}

impl SubjectKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Applicant => "applicant",
            Self::Campaign => "campaign",
            Self::Client => "client",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "applicant" | "application" => Some(Self::Applicant),
            "campaign" => Some(Self::Campaign),
            "client" => Some(Self::Client),
            _ => None,
        }
    }
}

impl std::fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed reference to a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubjectRef {
    pub kind: SubjectKind,
    pub id: DbId,
}

impl SubjectRef {
    pub fn applicant(id: DbId) -> Self {
        Self {
            kind: SubjectKind::Applicant,
            id,
        }
    }

    pub fn client(id: DbId) -> Self {
        Self {
            kind: SubjectKind::Client,
            id,
        }
    }
}

/// Read-only snapshot of a subject at evaluation time.
#[derive(Debug, Clone, Serialize)]
pub struct SubjectContext {
    pub subject: SubjectRef,
    pub client_id: DbId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub status: Option<String>,
    /// Status held before the current one, if any.
    pub previous_status: Option<String>,
    /// When the subject entered its current status.
    pub status_entered_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub job_title: Option<String>,
    pub campaign_id: Option<DbId>,
    pub campaign_name: Option<String>,
    pub location: Option<String>,
    pub source: Option<String>,
    pub interview_at: Option<Timestamp>,
    pub start_date: Option<NaiveDate>,
    pub is_talent_pool: bool,
    /// Additional attributes exposed to conditions by name.
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SubjectContext {
    /// Snapshot of an applicant with only the mandatory fields set.
    pub fn applicant(client_id: DbId, id: DbId, created_at: Timestamp) -> Self {
        Self::bare(SubjectRef::applicant(id), client_id, created_at)
    }

    /// Client-wide scope used by subject-less rules.
    pub fn client_scope(client_id: DbId, created_at: Timestamp) -> Self {
        Self::bare(SubjectRef::client(client_id), client_id, created_at)
    }

    fn bare(subject: SubjectRef, client_id: DbId, created_at: Timestamp) -> Self {
        Self {
            subject,
            client_id,
            first_name: None,
            last_name: None,
            email: None,
            status: None,
            previous_status: None,
            status_entered_at: None,
            created_at,
            job_title: None,
            campaign_id: None,
            campaign_name: None,
            location: None,
            source: None,
            interview_at: None,
            start_date: None,
            is_talent_pool: false,
            extra: serde_json::Map::new(),
        }
    }

    /// Builder-style status setter.
    pub fn with_status(mut self, status: impl Into<String>, entered_at: Timestamp) -> Self {
        self.status = Some(status.into());
        self.status_entered_at = Some(entered_at);
        self
    }

    /// The instant elapsed-time triggers count from: entry into the current
    /// status, or creation when the status entry time is unknown.
    pub fn reference_time(&self) -> Timestamp {
        self.status_entered_at.unwrap_or(self.created_at)
    }

    /// "First Last", or whichever half is present.
    pub fn full_name(&self) -> Option<String> {
        match (&self.first_name, &self.last_name) {
            (Some(f), Some(l)) => Some(format!("{f} {l}")),
            (Some(f), None) => Some(f.clone()),
            (None, Some(l)) => Some(l.clone()),
            (None, None) => None,
        }
    }

    /// Resolve a condition field by name.
    ///
    /// The outer `None` means the name is neither a built-in field nor a key
    /// of `extra`; `Some(None)` is a known field without a value.
    pub fn resolve_field(&self, name: &str, now: Timestamp) -> Option<Option<FieldValue>> {
        let text = |v: &Option<String>| v.as_ref().map(|s| FieldValue::Text(s.clone()));
        let value = match name {
            "status" => text(&self.status),
            "previous_status" => text(&self.previous_status),
            "first_name" => text(&self.first_name),
            "last_name" => text(&self.last_name),
            "email" => text(&self.email),
            "job_title" => text(&self.job_title),
            "campaign_name" => text(&self.campaign_name),
            "location" => text(&self.location),
            "source" => text(&self.source),
            "campaign_id" => self.campaign_id.map(|id| FieldValue::Number(id as f64)),
            "days_in_status" => self
                .status_entered_at
                .map(|at| FieldValue::Number(whole_days(now - at))),
            "days_since_created" => Some(FieldValue::Number(whole_days(now - self.created_at))),
            "has_interview" => Some(FieldValue::Bool(self.interview_at.is_some())),
            "is_talent_pool" => Some(FieldValue::Bool(self.is_talent_pool)),
            other => return self.extra.get(other).map(FieldValue::from_json),
        };
        Some(value)
    }

    /// The value of a field, `None` when unknown or unset.
    pub fn field(&self, name: &str, now: Timestamp) -> Option<FieldValue> {
        self.resolve_field(name, now).flatten()
    }
}

fn whole_days(elapsed: chrono::Duration) -> f64 {
    (elapsed.num_seconds() / SECONDS_PER_DAY) as f64
}
