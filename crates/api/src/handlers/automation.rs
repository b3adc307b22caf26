//! Handlers for the `/clients/{client_id}/automations` resource.

use axum::extract::{Path, State};
use axum::Json;
use recruitflow_core::types::DbId;
use recruitflow_db::models::automation::Automation;
use recruitflow_db::repositories::AutomationRepo;
use recruitflow_worker::rule::Rule;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// One rule as stored, plus whether the engine can evaluate it.
#[derive(Debug, Serialize)]
pub struct AutomationSnapshot {
    #[serde(flatten)]
    pub automation: Automation,
    /// Why the engine skips this rule, if it does.
    pub config_error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub is_active: bool,
}

/// GET /api/v1/clients/{client_id}/automations
pub async fn list_automations(
    State(state): State<AppState>,
    Path(client_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<AutomationSnapshot>>>> {
    let pipeline = state.store.pipeline(client_id).await?;
    let automations = AutomationRepo::list_for_client(&state.pool, client_id).await?;

    let data = automations
        .into_iter()
        .map(|automation| AutomationSnapshot {
            config_error: Rule::from_automation(&automation, &pipeline)
                .err()
                .map(|e| e.to_string()),
            automation,
        })
        .collect();
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/clients/{client_id}/automations/{id}/toggle
///
/// System automations can be toggled like any other.
pub async fn toggle_automation(
    State(state): State<AppState>,
    Path((client_id, id)): Path<(DbId, DbId)>,
    Json(input): Json<ToggleRequest>,
) -> AppResult<Json<DataResponse<Automation>>> {
    let automation = AutomationRepo::set_active(&state.pool, client_id, id, input.is_active)
        .await?
        .ok_or_else(|| AppError::not_found("Automation", id))?;

    tracing::info!(
        client_id,
        automation_id = id,
        is_active = automation.is_active,
        "Automation toggled",
    );
    Ok(Json(DataResponse { data: automation }))
}
