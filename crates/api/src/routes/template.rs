use axum::routing::post;
use axum::Router;

use crate::handlers::template;
use crate::state::AppState;

/// Routes mounted at `/clients/{client_id}/email-templates`.
///
/// ```text
/// POST   /{slug}/preview  -> preview_template
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{slug}/preview", post(template::preview_template))
}
