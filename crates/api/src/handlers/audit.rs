//! Handlers for the operator-facing automation audit log.

use axum::extract::{Path, Query, State};
use axum::Json;
use recruitflow_core::error::CoreError;
use recruitflow_core::types::DbId;
use recruitflow_db::models::audit::AuditEntry;
use recruitflow_db::repositories::AuditLogRepo;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 500;

#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct Acknowledged {
    pub id: DbId,
    pub acknowledged: bool,
}

/// GET /api/v1/clients/{client_id}/audit-log?limit=
pub async fn list_entries(
    State(state): State<AppState>,
    Path(client_id): Path<DbId>,
    Query(query): Query<AuditQuery>,
) -> AppResult<Json<DataResponse<Vec<AuditEntry>>>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(CoreError::Validation(format!("limit must be between 1 and {MAX_LIMIT}")).into());
    }
    let entries = AuditLogRepo::list_for_client(&state.pool, client_id, limit).await?;
    Ok(Json(DataResponse { data: entries }))
}

/// POST /api/v1/audit-log/{id}/acknowledge
///
/// Clears an alert. A rule held back by it runs again on the next tick.
pub async fn acknowledge(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Acknowledged>>> {
    if !AuditLogRepo::acknowledge(&state.pool, id).await? {
        return Err(AppError::conflict(format!(
            "Audit entry {id} has no open alert"
        )));
    }
    tracing::info!(audit_id = id, "Alert acknowledged");
    Ok(Json(DataResponse {
        data: Acknowledged {
            id,
            acknowledged: true,
        },
    }))
}
