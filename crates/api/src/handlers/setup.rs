//! Handlers for the first-run setup gate.
//!
//! Setup creates the initial administrator account and is available
//! exactly once: completing it writes a marker file whose presence
//! permanently closes the endpoint.

use std::path::Path;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use wicket_core::error::CoreError;
use wicket_core::validation::{validate_email, validate_password, validate_username};
use wicket_db::models::user::{CreateUser, UserResponse};
use wicket_db::repositories::UserRepo;

use crate::error::{AppError, AppResult};
use crate::handlers::auth::start_session;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /setup`.
#[derive(Debug, Deserialize)]
pub struct SetupRequest {
    pub username: String,
    pub firstname: String,
    pub lastname: String,
    pub email: Option<String>,
    pub password: String,
}

/// Response body for `GET /setup`.
#[derive(Debug, Serialize)]
pub struct SetupStatus {
    pub completed: bool,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/setup
///
/// Whether first-run setup has been completed.
pub async fn status(State(state): State<AppState>) -> Json<SetupStatus> {
    Json(SetupStatus {
        completed: is_complete(&state.config.setup_marker),
    })
}

/// POST /api/v1/setup
///
/// Create the initial account and log it in. 409 once completed.
pub async fn run(
    State(state): State<AppState>,
    Json(input): Json<SetupRequest>,
) -> AppResult<Response> {
    // 1. The gate: setup runs exactly once.
    if is_complete(&state.config.setup_marker) {
        return Err(AppError::Core(CoreError::Conflict(
            "Setup has already been completed".into(),
        )));
    }

    // 2. Validate the account fields.
    validate_username(&input.username).map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;
    validate_password(&input.password).map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;
    if let Some(email) = input.email.as_deref() {
        validate_email(email).map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;
    }

    // 3. Hash the password and create the user.
    let hashed = crate::auth::password::hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let create_dto = CreateUser {
        username: input.username,
        firstname: input.firstname,
        lastname: input.lastname,
        email: input.email,
        password_hash: Some(hashed),
    };
    let user = UserRepo::create(&state.pool, &create_dto).await?;

    // 4. Log the new account in.
    let (headers, expires_at) = start_session(&state, user.id).await?;

    // 5. Close the gate only after everything else succeeded.
    mark_complete(&state.config.setup_marker)
        .map_err(|e| AppError::InternalError(format!("Failed to write setup marker: {e}")))?;
    tracing::info!(user_id = user.id, "First-run setup completed");

    let body = crate::handlers::auth::SessionResponse {
        user: UserResponse::from(&user),
        expires_at,
    };
    Ok((StatusCode::CREATED, headers, Json(body)).into_response())
}

// ---------------------------------------------------------------------------
// Marker file
// ---------------------------------------------------------------------------

/// Whether the setup marker exists.
fn is_complete(marker: &Path) -> bool {
    marker.exists()
}

/// Touch the setup marker file.
fn mark_complete(marker: &Path) -> std::io::Result<()> {
    std::fs::write(marker, b"")
}
