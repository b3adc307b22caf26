//! Client, client settings, and pipeline models.

use recruitflow_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `clients` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Client {
    pub id: DbId,
    pub name: String,
    pub slug: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a client.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateClient {
    pub name: String,
    pub slug: String,
}

/// A row from the `client_settings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ClientSettings {
    pub client_id: DbId,
    pub company_name: Option<String>,
    pub sender_name: Option<String>,
    pub reply_to_email: Option<String>,
    pub email_signature: Option<String>,
    pub gdpr_footer_enabled: bool,
    pub gdpr_consent_text: Option<String>,
    pub portal_url: Option<String>,
    pub auto_archive_months: i32,
    pub auto_delete_months: i32,
    pub quiet_mode_until: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for updating client settings. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateClientSettings {
    pub company_name: Option<String>,
    pub sender_name: Option<String>,
    pub reply_to_email: Option<String>,
    pub email_signature: Option<String>,
    pub gdpr_footer_enabled: Option<bool>,
    pub gdpr_consent_text: Option<String>,
    pub portal_url: Option<String>,
    pub auto_archive_months: Option<i32>,
    pub auto_delete_months: Option<i32>,
}

/// A row from the `pipeline_statuses` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PipelineStatus {
    pub id: DbId,
    pub client_id: DbId,
    pub name: String,
    pub sort_order: i32,
    pub created_at: Timestamp,
}
