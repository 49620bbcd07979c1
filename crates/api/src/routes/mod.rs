pub mod auth;
pub mod health;
pub mod profile;
pub mod setup;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login           login (public)
/// /auth/logout          logout (public, idempotent)
/// /auth/me              current session (requires auth)
///
/// /setup                status (GET, public), run (POST, public, one-shot)
///
/// /profile              get, update (requires auth)
/// /profile/password     change password (PUT, requires auth)
///
/// /users                list, create (requires auth)
/// /users/{id}           update, delete (requires auth)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Authentication routes (login, logout, current session).
        .nest("/auth", auth::router())
        // First-run setup gate.
        .nest("/setup", setup::router())
        // Self-service profile.
        .nest("/profile", profile::router())
        // User directory management.
        .nest("/users", users::router())
}
