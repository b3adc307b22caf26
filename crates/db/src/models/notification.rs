//! Notification and notification preference models.

use recruitflow_core::notification::{EmailMode, PreferenceFlags};
use recruitflow_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `notifications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: DbId,
    pub client_id: DbId,
    pub user_id: DbId,
    pub event_type: String,
    pub title: String,
    pub body: Option<String>,
    pub link: Option<String>,
    pub channel: String,
    pub subject_type: Option<String>,
    pub subject_id: Option<DbId>,
    pub is_read: bool,
    pub read_at: Option<Timestamp>,
    pub is_delivered: bool,
    pub delivered_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// Insert payload for a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewNotification {
    pub client_id: DbId,
    pub user_id: DbId,
    pub event_type: String,
    pub title: String,
    pub body: Option<String>,
    pub link: Option<String>,
    pub channel: String,
    pub subject_type: Option<String>,
    pub subject_id: Option<DbId>,
}

/// A row from the `notification_preferences` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NotificationPreference {
    pub id: DbId,
    pub client_id: DbId,
    pub user_id: DbId,
    pub event_type: String,
    pub portal_enabled: bool,
    pub email_enabled: bool,
    pub email_mode: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl NotificationPreference {
    pub fn flags(&self) -> PreferenceFlags {
        PreferenceFlags {
            portal_enabled: self.portal_enabled,
            email_enabled: self.email_enabled,
            email_mode: EmailMode::parse(&self.email_mode),
        }
    }
}

/// DTO for inserting or replacing a preference.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertPreference {
    pub client_id: DbId,
    pub user_id: DbId,
    pub event_type: String,
    pub portal_enabled: bool,
    pub email_enabled: bool,
    pub email_mode: EmailMode,
}

/// Pending digest rows of one user.
#[derive(Debug, Clone, FromRow)]
pub struct DigestRecipient {
    pub client_id: DbId,
    pub user_id: DbId,
    pub email: String,
    pub pending: i64,
}
