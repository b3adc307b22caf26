//! Repository for the `portal_users` table.

use recruitflow_core::types::DbId;
use sqlx::PgPool;

use crate::models::portal_user::{CreatePortalUser, PortalUser};

const COLUMNS: &str = "id, client_id, email, display_name, is_active, created_at";

/// Provides access to a client's portal users.
pub struct PortalUserRepo;

impl PortalUserRepo {
    pub async fn create(pool: &PgPool, input: &CreatePortalUser) -> Result<PortalUser, sqlx::Error> {
        let query = format!(
            "INSERT INTO portal_users (client_id, email, display_name) \
             VALUES ($1, $2, $3) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PortalUser>(&query)
            .bind(input.client_id)
            .bind(&input.email)
            .bind(&input.display_name)
            .fetch_one(pool)
            .await
    }

    pub async fn list_active(pool: &PgPool, client_id: DbId) -> Result<Vec<PortalUser>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM portal_users WHERE client_id = $1 AND is_active ORDER BY id"
        );
        sqlx::query_as::<_, PortalUser>(&query)
            .bind(client_id)
            .fetch_all(pool)
            .await
    }
}
