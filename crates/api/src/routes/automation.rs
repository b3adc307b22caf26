use axum::routing::{get, post};
use axum::Router;

use crate::handlers::automation;
use crate::state::AppState;

/// Routes mounted at `/clients/{client_id}/automations`.
///
/// ```text
/// GET    /                -> list_automations
/// POST   /{id}/toggle     -> toggle_automation
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(automation::list_automations))
        .route("/{id}/toggle", post(automation::toggle_automation))
}
