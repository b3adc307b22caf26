//! Handlers for operator decisions on held messages.

use axum::extract::{Path, State};
use axum::Json;
use recruitflow_core::types::DbId;
use recruitflow_db::models::review_queue::{ReviewItem, REVIEW_REJECTED, REVIEW_SENT};
use recruitflow_db::repositories::{ClientSettingsRepo, ReviewQueueRepo};
use recruitflow_events::{send_with_retry, OutboundMessage};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/clients/{client_id}/review-queue
pub async fn list_pending(
    State(state): State<AppState>,
    Path(client_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<ReviewItem>>>> {
    let items = ReviewQueueRepo::list_pending(&state.pool, client_id).await?;
    Ok(Json(DataResponse { data: items }))
}

/// POST /api/v1/review-queue/{id}/approve
///
/// The item stays locked while the message is sent, so two approvals of the
/// same item cannot both send it. A failed send leaves it pending.
pub async fn approve(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ReviewItem>>> {
    let mut tx = state.pool.begin().await?;
    let Some(item) = ReviewQueueRepo::lock_pending(&mut tx, id).await? else {
        return Err(already_decided_or_missing(&state, id).await);
    };

    let settings = ClientSettingsRepo::get(&state.pool, item.client_id).await?;
    let message = OutboundMessage {
        to: item.recipient.clone(),
        from_name: settings
            .as_ref()
            .and_then(|s| s.sender_name.clone().or_else(|| s.company_name.clone())),
        reply_to: settings.and_then(|s| s.reply_to_email),
        subject: item.subject.clone(),
        body: item.body.clone(),
    };
    send_with_retry(state.transport.as_ref(), &message, state.retry()).await?;

    let decided = ReviewQueueRepo::decide(&mut tx, id, REVIEW_SENT)
        .await?
        .ok_or_else(|| AppError::conflict(format!("Review item {id} was already decided")))?;
    tx.commit().await?;

    tracing::info!(
        review_id = id,
        client_id = decided.client_id,
        rule_kind = %decided.rule_kind,
        rule_id = decided.rule_id,
        "Review item approved and sent",
    );
    Ok(Json(DataResponse { data: decided }))
}

/// POST /api/v1/review-queue/{id}/reject
pub async fn reject(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ReviewItem>>> {
    let mut conn = state.pool.acquire().await?;
    let Some(decided) = ReviewQueueRepo::decide(&mut conn, id, REVIEW_REJECTED).await? else {
        return Err(already_decided_or_missing(&state, id).await);
    };

    tracing::info!(review_id = id, client_id = decided.client_id, "Review item rejected");
    Ok(Json(DataResponse { data: decided }))
}

/// Tell a decided item (409) apart from a missing one (404).
async fn already_decided_or_missing(state: &AppState, id: DbId) -> AppError {
    match ReviewQueueRepo::find_by_id(&state.pool, id).await {
        Ok(Some(item)) => AppError::conflict(format!(
            "Review item {id} was already decided ({})",
            item.status
        )),
        Ok(None) => AppError::not_found("Review item", id),
        Err(e) => AppError::Database(e),
    }
}
