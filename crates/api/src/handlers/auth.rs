//! Handlers for the `/auth` resource (login, logout, current session).

use axum::extract::State;
use axum::http::header::{HeaderMap, SET_COOKIE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use wicket_core::error::CoreError;
use wicket_core::types::Timestamp;
use wicket_db::models::user::UserResponse;
use wicket_db::repositories::UserRepo;

use crate::auth::cookie;
use crate::auth::password::verify_password;
use crate::auth::token::generate_session_token;
use crate::error::{AppError, AppResult};
use crate::middleware::session::CurrentUser;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Successful authentication response returned by login and `/auth/me`.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: UserResponse,
    /// When the session lapses unless renewed by activity.
    pub expires_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/login
///
/// Authenticate with username + password. On success a new session is
/// created and bound to the browser via the session cookie.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Response> {
    // 1. Find the user. Unknown usernames and wrong passwords collapse
    //    to the same 401 so nothing is disclosed about which failed.
    let user = UserRepo::find_by_username(&state.pool, &input.username)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid username or password".into(),
            ))
        })?;

    // 2. A user without a password hash has not been activated and
    //    cannot log in; indistinguishable from a wrong password.
    let Some(password_hash) = user.password_hash.as_deref() else {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Invalid username or password".into(),
        )));
    };

    // 3. Verify the password.
    let password_valid = verify_password(&input.password, password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_valid {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Invalid username or password".into(),
        )));
    }

    // 4. Disabled accounts are rejected after the password check.
    if user.disabled {
        return Err(AppError::Core(CoreError::Forbidden(
            "This account is disabled".into(),
        )));
    }

    // 5. Stamp last_login.
    UserRepo::record_login(&state.pool, user.id).await?;

    // 6. Issue a token, create the session, and bind the cookie.
    let (headers, expires_at) = start_session(&state, user.id).await?;

    let body = SessionResponse {
        user: UserResponse::from(&user),
        expires_at,
    };
    Ok((StatusCode::OK, headers, Json(body)).into_response())
}

/// POST /api/v1/auth/logout
///
/// Invalidate the presented session (idempotent) and clear the cookie.
/// Returns 204 No Content.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    if let Some(token) = cookie::session_token(&headers) {
        state.sessions.invalidate(&token).await?;
    }

    // Always clear the cookie, even if no session record existed.
    let mut response_headers = HeaderMap::new();
    let clear = cookie::clear_session_cookie(state.config.cookie_secure)
        .map_err(|e| AppError::InternalError(format!("Cookie encoding error: {e}")))?;
    response_headers.insert(SET_COOKIE, clear);

    Ok((StatusCode::NO_CONTENT, response_headers).into_response())
}

/// GET /api/v1/auth/me
///
/// The authenticated user and session expiry; 401 when anonymous.
pub async fn me(current: CurrentUser) -> Json<SessionResponse> {
    Json(SessionResponse {
        user: UserResponse::from(&current.user),
        expires_at: current.session.expires_at,
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Generate a fresh token, persist a session for `user_id`, and build the
/// `Set-Cookie` header carrying the raw token.
///
/// Shared by login and first-run setup.
pub(crate) async fn start_session(
    state: &AppState,
    user_id: wicket_core::types::DbId,
) -> AppResult<(HeaderMap, Timestamp)> {
    let token = generate_session_token();
    let session = state.sessions.create_session(&token, user_id).await?;

    let mut headers = HeaderMap::new();
    let value = cookie::session_cookie(&token, session.expires_at, state.config.cookie_secure)
        .map_err(|e| AppError::InternalError(format!("Cookie encoding error: {e}")))?;
    headers.insert(SET_COOKIE, value);

    Ok((headers, session.expires_at))
}
