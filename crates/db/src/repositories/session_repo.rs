//! Repository for the `sessions` table.

use sqlx::{FromRow, PgPool};
use wicket_core::types::{DbId, Timestamp};

use crate::models::session::{NewSession, Session};
use crate::models::user::User;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, expires_at, created_at";

/// Flat row for the session+user join; split into the two models after
/// fetching.
#[derive(FromRow)]
struct SessionUserRow {
    id: String,
    user_id: DbId,
    expires_at: Timestamp,
    created_at: Timestamp,
    u_username: String,
    u_firstname: String,
    u_lastname: String,
    u_email: Option<String>,
    u_password_hash: Option<String>,
    u_disabled: bool,
    u_last_login: Option<Timestamp>,
    u_created_at: Timestamp,
    u_updated_at: Timestamp,
}

impl From<SessionUserRow> for (Session, User) {
    fn from(row: SessionUserRow) -> Self {
        let session = Session {
            id: row.id,
            user_id: row.user_id,
            expires_at: row.expires_at,
            created_at: row.created_at,
        };
        let user = User {
            id: row.user_id,
            username: row.u_username,
            firstname: row.u_firstname,
            lastname: row.u_lastname,
            email: row.u_email,
            password_hash: row.u_password_hash,
            disabled: row.u_disabled,
            last_login: row.u_last_login,
            created_at: row.u_created_at,
            updated_at: row.u_updated_at,
        };
        (session, user)
    }
}

/// Provides CRUD operations for sessions.
pub struct SessionRepo;

impl SessionRepo {
    /// Insert a new session, returning the created row.
    ///
    /// Fails with a unique violation if the id is already present.
    pub async fn insert(pool: &PgPool, input: &NewSession) -> Result<Session, sqlx::Error> {
        let query = format!(
            "INSERT INTO sessions (id, user_id, expires_at)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Session>(&query)
            .bind(&input.id)
            .bind(input.user_id)
            .bind(input.expires_at)
            .fetch_one(pool)
            .await
    }

    /// Find a session by id joined with its user.
    ///
    /// Expiry is NOT filtered here; the caller enforces the expiration
    /// policy (lazy delete on expired read).
    pub async fn find_by_id_with_user(
        pool: &PgPool,
        id: &str,
    ) -> Result<Option<(Session, User)>, sqlx::Error> {
        let row = sqlx::query_as::<_, SessionUserRow>(
            "SELECT s.id, s.user_id, s.expires_at, s.created_at,
                    u.username AS u_username, u.firstname AS u_firstname,
                    u.lastname AS u_lastname, u.email AS u_email,
                    u.password_hash AS u_password_hash, u.disabled AS u_disabled,
                    u.last_login AS u_last_login, u.created_at AS u_created_at,
                    u.updated_at AS u_updated_at
             FROM sessions s
             INNER JOIN users u ON u.id = s.user_id
             WHERE s.id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(row.map(Into::into))
    }

    /// Move a session's expiry. Returns `true` if the row was updated.
    pub async fn update_expiry(
        pool: &PgPool,
        id: &str,
        expires_at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE sessions SET expires_at = $2 WHERE id = $1")
            .bind(id)
            .bind(expires_at)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a session by id. Idempotent: deleting an absent id is not
    /// an error.
    pub async fn delete(pool: &PgPool, id: &str) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Delete all sessions for a user (account disable/teardown).
    /// Returns the count of deleted rows.
    pub async fn delete_all_for_user(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
