use axum::routing::{get, post};
use axum::Router;

use crate::handlers::audit;
use crate::state::AppState;

/// Audit log routes.
///
/// ```text
/// GET    /clients/{client_id}/audit-log     -> list_entries
/// POST   /audit-log/{id}/acknowledge        -> acknowledge
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/clients/{client_id}/audit-log", get(audit::list_entries))
        .route("/audit-log/{id}/acknowledge", post(audit::acknowledge))
}
