use axum::routing::{get, post};
use axum::Router;

use crate::handlers::review_queue;
use crate::state::AppState;

/// Review queue routes.
///
/// ```text
/// GET    /clients/{client_id}/review-queue  -> list_pending
/// POST   /review-queue/{id}/approve         -> approve
/// POST   /review-queue/{id}/reject          -> reject
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/clients/{client_id}/review-queue",
            get(review_queue::list_pending),
        )
        .route("/review-queue/{id}/approve", post(review_queue::approve))
        .route("/review-queue/{id}/reject", post(review_queue::reject))
}
