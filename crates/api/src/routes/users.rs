//! Route definitions for the `/users` resource.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::users;
use crate::state::AppState;

/// Routes mounted at `/users` (all require auth).
///
/// ```text
/// GET    /      -> list directory
/// POST   /      -> create (not-yet-activated) entry
/// PUT    /{id}  -> update entry (disabling signs the account out)
/// DELETE /{id}  -> hard delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(users::list_users).post(users::create_user))
        .route("/{id}", put(users::update_user).delete(users::delete_user))
}
