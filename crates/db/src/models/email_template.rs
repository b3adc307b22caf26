//! Message template models.

use recruitflow_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// `recipient_type` value: the subject applicant.
pub const RECIPIENT_APPLICANT: &str = "applicant";
/// `recipient_type` value: the client's reply-to address.
pub const RECIPIENT_CLIENT: &str = "client";

/// A row from the `email_templates` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EmailTemplate {
    pub id: DbId,
    pub client_id: DbId,
    pub slug: String,
    pub name: String,
    pub subject: String,
    pub body: String,
    pub recipient_type: String,
    pub is_active: bool,
    pub review_before_send: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a template.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEmailTemplate {
    pub client_id: DbId,
    pub slug: String,
    pub name: String,
    pub subject: String,
    pub body: String,
    pub recipient_type: Option<String>,
    pub review_before_send: Option<bool>,
}

/// DTO for updating a template. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEmailTemplate {
    pub name: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub recipient_type: Option<String>,
    pub is_active: Option<bool>,
    pub review_before_send: Option<bool>,
}
