//! Handlers for the `/users` resource (the directory).
//!
//! This is a single-tier admin application: every authenticated user
//! may manage the directory.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use wicket_core::error::CoreError;
use wicket_core::types::DbId;
use wicket_core::validation::{validate_email, validate_username};
use wicket_db::models::user::{CreateUser, UpdateUser, UserResponse};
use wicket_db::repositories::{SessionRepo, UserRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::session::CurrentUser;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /users`.
///
/// No password: a freshly created account is not activated and cannot
/// log in until a password is set.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub firstname: String,
    pub lastname: String,
    pub email: Option<String>,
}

/// Request body for `PUT /users/{id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<String>,
    pub disabled: Option<bool>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/users
///
/// The full directory, sanitized (no password hashes).
pub async fn list_users(
    State(state): State<AppState>,
    _current: CurrentUser,
) -> AppResult<Json<Vec<UserResponse>>> {
    let users = UserRepo::list(&state.pool).await?;
    let responses: Vec<UserResponse> = users.iter().map(UserResponse::from).collect();
    Ok(Json(responses))
}

/// POST /api/v1/users
///
/// Create a not-yet-activated directory entry. Returns 201 Created.
pub async fn create_user(
    State(state): State<AppState>,
    _current: CurrentUser,
    Json(input): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    validate_username(&input.username).map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;
    if let Some(email) = input.email.as_deref() {
        validate_email(email).map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;
    }

    let create_dto = CreateUser {
        username: input.username,
        firstname: input.firstname,
        lastname: input.lastname,
        email: input.email,
        password_hash: None,
    };
    let user = UserRepo::create(&state.pool, &create_dto).await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// PUT /api/v1/users/{id}
///
/// Update a directory entry. Disabling an account also tears down its
/// sessions so it is signed out everywhere immediately.
pub async fn update_user(
    State(state): State<AppState>,
    _current: CurrentUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateUserRequest>,
) -> AppResult<Json<UserResponse>> {
    if let Some(email) = input.email.as_deref() {
        validate_email(email).map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;
    }

    let update_dto = UpdateUser {
        firstname: input.firstname,
        lastname: input.lastname,
        email: input.email,
        disabled: input.disabled,
    };
    let user = UserRepo::update(&state.pool, id, &update_dto)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))?;

    if user.disabled {
        let deleted = SessionRepo::delete_all_for_user(&state.pool, id).await?;
        if deleted > 0 {
            tracing::info!(user_id = id, sessions = deleted, "Disabled account signed out");
        }
    }

    Ok(Json(UserResponse::from(&user)))
}

/// DELETE /api/v1/users/{id}
///
/// Hard-delete a directory entry; its sessions go with it via FK
/// cascade. Returns 204 No Content.
pub async fn delete_user(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if id == current.user.id {
        return Err(AppError::BadRequest(
            "Cannot delete your own account".into(),
        ));
    }

    let deleted = UserRepo::delete(&state.pool, id).await?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::NotFound { entity: "User", id }))
    }
}
