//! Route definitions for the first-run setup gate.

use axum::routing::get;
use axum::Router;

use crate::handlers::setup;
use crate::state::AppState;

/// Routes mounted at `/setup`.
///
/// ```text
/// GET  /  -> setup status
/// POST /  -> run setup (one-shot; 409 afterwards)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(setup::status).post(setup::run))
}
