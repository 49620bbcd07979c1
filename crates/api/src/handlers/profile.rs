//! Handlers for the `/profile` resource (self service).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use wicket_core::error::CoreError;
use wicket_core::validation::{validate_email, validate_password};
use wicket_db::models::user::{UpdateUser, UserResponse};
use wicket_db::repositories::UserRepo;

use crate::auth::password::{hash_password, verify_password};
use crate::error::{AppError, AppResult};
use crate::middleware::session::CurrentUser;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `PUT /profile`.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<String>,
}

/// Request body for `PUT /profile/password`.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub password: String,
    pub confirm: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/profile
///
/// The authenticated user's own directory entry.
pub async fn get_profile(current: CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from(&current.user))
}

/// PUT /api/v1/profile
///
/// Update the authenticated user's name and email.
pub async fn update_profile(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(input): Json<UpdateProfileRequest>,
) -> AppResult<Json<UserResponse>> {
    if let Some(email) = input.email.as_deref() {
        validate_email(email).map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;
    }

    let update_dto = UpdateUser {
        firstname: input.firstname,
        lastname: input.lastname,
        email: input.email,
        disabled: None,
    };
    let id = current.user.id;
    let user = UserRepo::update(&state.pool, id, &update_dto)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))?;

    Ok(Json(UserResponse::from(&user)))
}

/// PUT /api/v1/profile/password
///
/// Change the authenticated user's password. Returns 204 No Content.
pub async fn change_password(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(input): Json<ChangePasswordRequest>,
) -> AppResult<StatusCode> {
    // 1. Both fields must agree before anything else is checked.
    if input.password != input.confirm {
        return Err(AppError::Core(CoreError::Validation(
            "Passwords do not match".into(),
        )));
    }

    // 2. Strength rules.
    validate_password(&input.password).map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    // 3. Hash, then verify the fresh hash round-trips before persisting.
    let hashed = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;
    let reliable = verify_password(&input.password, &hashed)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !reliable {
        return Err(AppError::InternalError(
            "Password hash failed verification".into(),
        ));
    }

    // 4. Persist.
    let id = current.user.id;
    let updated = UserRepo::update_password(&state.pool, id, &hashed).await?;
    if !updated {
        return Err(AppError::Core(CoreError::NotFound { entity: "User", id }));
    }

    Ok(StatusCode::NO_CONTENT)
}
