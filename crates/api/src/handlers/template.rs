//! Manual test-send of message templates.

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use recruitflow_core::types::DbId;
use recruitflow_worker::preview::{self, TemplatePreview};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/clients/{client_id}/email-templates/{slug}/preview
///
/// Render the template against sample data. Nothing is recorded or sent.
pub async fn preview_template(
    State(state): State<AppState>,
    Path((client_id, slug)): Path<(DbId, String)>,
) -> AppResult<Json<DataResponse<TemplatePreview>>> {
    let preview = preview::preview_template(
        state.store.as_ref(),
        client_id,
        &slug,
        Utc::now(),
        state.engine_config.utc_offset,
    )
    .await?
    .ok_or_else(|| AppError::not_found("Email template", &slug))?;

    Ok(Json(DataResponse { data: preview }))
}
