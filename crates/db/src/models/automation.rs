//! Automation rule models.

use chrono::NaiveTime;
use recruitflow_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `automations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Automation {
    pub id: DbId,
    pub client_id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub trigger_type: String,
    pub trigger_config: serde_json::Value,
    pub condition_config: Option<serde_json::Value>,
    pub action_type: String,
    pub action_config: serde_json::Value,
    pub is_active: bool,
    pub is_system: bool,
    pub only_once_per_subject: bool,
    pub send_window_start: Option<NaiveTime>,
    pub send_window_end: Option<NaiveTime>,
    pub last_triggered_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating an automation.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAutomation {
    pub client_id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub trigger_type: String,
    pub trigger_config: Option<serde_json::Value>,
    pub condition_config: Option<serde_json::Value>,
    pub action_type: String,
    pub action_config: Option<serde_json::Value>,
    pub is_active: Option<bool>,
    pub is_system: Option<bool>,
    pub only_once_per_subject: Option<bool>,
    pub send_window_start: Option<NaiveTime>,
    pub send_window_end: Option<NaiveTime>,
}

/// DTO for updating an automation. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAutomation {
    pub name: Option<String>,
    pub description: Option<String>,
    pub trigger_type: Option<String>,
    pub trigger_config: Option<serde_json::Value>,
    pub condition_config: Option<serde_json::Value>,
    pub action_type: Option<String>,
    pub action_config: Option<serde_json::Value>,
    pub only_once_per_subject: Option<bool>,
    pub send_window_start: Option<NaiveTime>,
    pub send_window_end: Option<NaiveTime>,
}
