use axum::routing::post;
use axum::Router;

use crate::handlers::event;
use crate::state::AppState;

/// Routes mounted at `/events`.
///
/// ```text
/// POST   /        -> notify_event
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(event::notify_event))
}
