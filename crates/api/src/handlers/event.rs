//! Handler for the inbound event interface.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use recruitflow_worker::{InboundEvent, RuleOutcome};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/events
///
/// Evaluate the subject's event-driven automations inline and report what
/// each matching rule did.
pub async fn notify_event(
    State(state): State<AppState>,
    Json(event): Json<InboundEvent>,
) -> AppResult<Json<DataResponse<Vec<RuleOutcome>>>> {
    let outcomes = state.engine.notify_event(&event, Utc::now()).await?;
    Ok(Json(DataResponse { data: outcomes }))
}
