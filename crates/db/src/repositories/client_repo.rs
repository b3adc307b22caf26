//! Repository for the `clients` table.

use recruitflow_core::types::DbId;
use sqlx::PgPool;

use crate::models::client::{Client, CreateClient};

const COLUMNS: &str = "id, name, slug, is_active, created_at, updated_at";

/// Provides access to clients.
pub struct ClientRepo;

impl ClientRepo {
    /// Insert a client together with its default settings row.
    pub async fn create(pool: &PgPool, input: &CreateClient) -> Result<Client, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let query = format!(
            "INSERT INTO clients (name, slug) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        let client = sqlx::query_as::<_, Client>(&query)
            .bind(&input.name)
            .bind(&input.slug)
            .fetch_one(&mut *tx)
            .await?;
        sqlx::query("INSERT INTO client_settings (client_id, company_name) VALUES ($1, $2)")
            .bind(client.id)
            .bind(&input.name)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(client)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Client>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM clients WHERE id = $1");
        sqlx::query_as::<_, Client>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All active clients, oldest first.
    pub async fn list_active(pool: &PgPool) -> Result<Vec<Client>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM clients WHERE is_active ORDER BY id");
        sqlx::query_as::<_, Client>(&query).fetch_all(pool).await
    }
}
