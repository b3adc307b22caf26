//! Reminder models.

use recruitflow_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `reminders` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Reminder {
    pub id: DbId,
    pub client_id: DbId,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub target_type: String,
    pub target_status: Option<String>,
    pub config: serde_json::Value,
    pub linked_template_slug: Option<String>,
    pub is_active: bool,
    pub last_triggered_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a reminder.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateReminder {
    pub client_id: DbId,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub target_status: Option<String>,
    pub config: Option<serde_json::Value>,
    pub linked_template_slug: Option<String>,
    pub is_active: Option<bool>,
}

/// DTO for updating a reminder. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateReminder {
    pub name: Option<String>,
    pub description: Option<String>,
    pub target_status: Option<String>,
    pub config: Option<serde_json::Value>,
    pub linked_template_slug: Option<String>,
}
