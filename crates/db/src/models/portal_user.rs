//! Portal user models.

use recruitflow_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `portal_users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PortalUser {
    pub id: DbId,
    pub client_id: DbId,
    pub email: String,
    pub display_name: Option<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
}

/// DTO for creating a portal user.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePortalUser {
    pub client_id: DbId,
    pub email: String,
    pub display_name: Option<String>,
}
