//! Repository for the `pipeline_statuses` table.

use recruitflow_core::types::DbId;
use sqlx::PgPool;

use crate::models::client::PipelineStatus;

const COLUMNS: &str = "id, client_id, name, sort_order, created_at";

/// Provides access to client-defined pipelines.
pub struct PipelineStatusRepo;

impl PipelineStatusRepo {
    pub async fn create(
        pool: &PgPool,
        client_id: DbId,
        name: &str,
        sort_order: i32,
    ) -> Result<PipelineStatus, sqlx::Error> {
        let query = format!(
            "INSERT INTO pipeline_statuses (client_id, name, sort_order) \
             VALUES ($1, $2, $3) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PipelineStatus>(&query)
            .bind(client_id)
            .bind(name)
            .bind(sort_order)
            .fetch_one(pool)
            .await
    }

    /// Status names of a client in display order. Empty when the client
    /// uses the default pipeline.
    pub async fn list_names(pool: &PgPool, client_id: DbId) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT name FROM pipeline_statuses WHERE client_id = $1 ORDER BY sort_order, id",
        )
        .bind(client_id)
        .fetch_all(pool)
        .await
    }
}
