//! Session model and DTOs.

use sqlx::FromRow;
use wicket_core::types::{DbId, Timestamp};

/// A session row from the `sessions` table.
///
/// `id` is the SHA-256 hex digest of the bearer token, fixed for the
/// life of the session; renewal updates only `expires_at`.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: String,
    pub user_id: DbId,
    pub expires_at: Timestamp,
    pub created_at: Timestamp,
}

/// DTO for inserting a new session.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub id: String,
    pub user_id: DbId,
    pub expires_at: Timestamp,
}
