pub mod audit;
pub mod automation;
pub mod event;
pub mod health;
pub mod review_queue;
pub mod template;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /events                                          inbound record events
/// /clients/{client_id}/automations                 rule snapshot, toggle
/// /clients/{client_id}/email-templates/{slug}      template preview
/// /clients/{client_id}/review-queue                pending reviews
/// /review-queue/{id}                               approve, reject
/// /clients/{client_id}/audit-log                   audit entries
/// /audit-log/{id}/acknowledge                      clear an alert
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/events", event::router())
        .nest("/clients/{client_id}/automations", automation::router())
        .nest("/clients/{client_id}/email-templates", template::router())
        .merge(review_queue::router())
        .merge(audit::router())
}
