//! Session lifecycle: the store contract and the manager that enforces
//! creation, validation, sliding renewal, and invalidation.
//!
//! The manager never performs I/O beyond its injected [`SessionStore`],
//! and holds no lock across requests. Two concurrent requests may both
//! observe a session inside the renewal window and both extend it; that
//! race is benign (last write wins, both compute `now + TTL`).

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use wicket_core::types::{DbId, Timestamp};
use wicket_db::models::session::{NewSession, Session};
use wicket_db::models::user::User;
use wicket_db::repositories::SessionRepo;
use wicket_db::DbPool;

use crate::auth::token::derive_session_id;

/// Session lifetime in minutes. An idle session lapses after this long.
pub const SESSION_TTL_MINS: i64 = 60;

/// Width of the sliding-renewal window in minutes. A session validated
/// within this many minutes of its expiry is extended by a full TTL.
pub const RENEWAL_WINDOW_MINS: i64 = 20;

/// Error from the persistence collaborator.
///
/// `Unavailable` must propagate to the caller as a hard failure -- an
/// infrastructure fault must never be masked as "unauthenticated".
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("session id already exists")]
    Conflict,

    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence contract the session manager consumes.
///
/// Injected at construction so tests can substitute an in-memory double;
/// the production implementation is [`PgSessionStore`].
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert a new session. Fails with [`StoreError::Conflict`] if the
    /// id is already present.
    async fn insert(&self, session: &NewSession) -> Result<Session, StoreError>;

    /// Look up a session joined with its user. `None` when absent.
    async fn find_by_id_join_user(&self, id: &str)
        -> Result<Option<(Session, User)>, StoreError>;

    /// Move a session's expiry. `false` when the row is gone.
    async fn update_expiry(&self, id: &str, expires_at: Timestamp) -> Result<bool, StoreError>;

    /// Delete a session. Idempotent: an absent id is not an error.
    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}

/// A validated session together with its user.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub session: Session,
    pub user: User,
    /// Set when this validation extended the expiry; the transport layer
    /// must refresh the cookie's expiration to match.
    pub renewed: bool,
}

/// Orchestrates the session lifecycle over an injected [`SessionStore`].
///
/// Cheaply cloneable; every operation reads authoritative state from the
/// store (no in-process session cache).
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Create a session for `user_id` bound to `token`, expiring a full
    /// TTL from now. One store write.
    pub async fn create_session(&self, token: &str, user_id: DbId) -> Result<Session, StoreError> {
        let session = NewSession {
            id: derive_session_id(token),
            user_id,
            expires_at: Utc::now() + Duration::minutes(SESSION_TTL_MINS),
        };
        self.store.insert(&session).await
    }

    /// Validate a presented token.
    ///
    /// Returns `Ok(None)` for the anonymous states: no token, unknown
    /// token, or an expired session. Expiration is destructive -- an
    /// expired session is deleted on first read and cannot be revived.
    /// A session inside the renewal window is extended to `now + TTL`
    /// and the update persisted before returning.
    pub async fn validate(&self, token: Option<&str>) -> Result<Option<AuthSession>, StoreError> {
        // No token presented: normal anonymous state, zero store accesses.
        let Some(token) = token else {
            return Ok(None);
        };

        let id = derive_session_id(token);
        let Some((mut session, user)) = self.store.find_by_id_join_user(&id).await? else {
            return Ok(None);
        };

        let now = Utc::now();
        if now >= session.expires_at {
            // Lazy expiration: consume the row on first read after expiry.
            self.store.delete(&id).await?;
            return Ok(None);
        }

        let mut renewed = false;
        if now >= session.expires_at - Duration::minutes(RENEWAL_WINDOW_MINS) {
            session.expires_at = now + Duration::minutes(SESSION_TTL_MINS);
            self.store.update_expiry(&id, session.expires_at).await?;
            renewed = true;
        }

        Ok(Some(AuthSession {
            session,
            user,
            renewed,
        }))
    }

    /// Invalidate the session bound to `token` (explicit logout).
    /// Idempotent: an unknown token is not an error.
    pub async fn invalidate(&self, token: &str) -> Result<(), StoreError> {
        self.store.delete(&derive_session_id(token)).await
    }
}

// ---------------------------------------------------------------------------
// Postgres store
// ---------------------------------------------------------------------------

/// [`SessionStore`] backed by the `sessions` table via [`SessionRepo`].
pub struct PgSessionStore {
    pool: DbPool,
}

impl PgSessionStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_sqlx(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        // PostgreSQL unique constraint violation: error code 23505.
        if db_err.code().as_deref() == Some("23505") {
            return StoreError::Conflict;
        }
    }
    tracing::error!(error = %err, "Session store error");
    StoreError::Unavailable(err.to_string())
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn insert(&self, session: &NewSession) -> Result<Session, StoreError> {
        SessionRepo::insert(&self.pool, session)
            .await
            .map_err(map_sqlx)
    }

    async fn find_by_id_join_user(
        &self,
        id: &str,
    ) -> Result<Option<(Session, User)>, StoreError> {
        SessionRepo::find_by_id_with_user(&self.pool, id)
            .await
            .map_err(map_sqlx)
    }

    async fn update_expiry(&self, id: &str, expires_at: Timestamp) -> Result<bool, StoreError> {
        SessionRepo::update_expiry(&self.pool, id, expires_at)
            .await
            .map_err(map_sqlx)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        SessionRepo::delete(&self.pool, id).await.map_err(map_sqlx)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::generate_session_token;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory store double with operation counters, so tests can
    /// assert on exactly how many reads and writes an operation issued.
    #[derive(Default)]
    struct MemoryStore {
        sessions: Mutex<HashMap<String, Session>>,
        users: Mutex<HashMap<DbId, User>>,
        reads: AtomicUsize,
        writes: AtomicUsize,
    }

    impl MemoryStore {
        fn add_user(&self, id: DbId) {
            self.users.lock().unwrap().insert(id, test_user(id));
        }

        fn expires_at(&self, id: &str) -> Option<Timestamp> {
            self.sessions.lock().unwrap().get(id).map(|s| s.expires_at)
        }

        /// Rewrite a stored expiry directly, simulating elapsed time.
        fn set_expires_at(&self, id: &str, expires_at: Timestamp) {
            self.sessions
                .lock()
                .unwrap()
                .get_mut(id)
                .expect("session should exist")
                .expires_at = expires_at;
        }

        fn read_count(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }

        fn write_count(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }
    }

    fn test_user(id: DbId) -> User {
        User {
            id,
            username: format!("user{id}"),
            firstname: "Test".to_string(),
            lastname: "User".to_string(),
            email: None,
            password_hash: Some("$argon2id$fake".to_string()),
            disabled: false,
            last_login: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[async_trait]
    impl SessionStore for MemoryStore {
        async fn insert(&self, input: &NewSession) -> Result<Session, StoreError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            let mut sessions = self.sessions.lock().unwrap();
            if sessions.contains_key(&input.id) {
                return Err(StoreError::Conflict);
            }
            let session = Session {
                id: input.id.clone(),
                user_id: input.user_id,
                expires_at: input.expires_at,
                created_at: Utc::now(),
            };
            sessions.insert(input.id.clone(), session.clone());
            Ok(session)
        }

        async fn find_by_id_join_user(
            &self,
            id: &str,
        ) -> Result<Option<(Session, User)>, StoreError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            let sessions = self.sessions.lock().unwrap();
            let Some(session) = sessions.get(id) else {
                return Ok(None);
            };
            let users = self.users.lock().unwrap();
            let user = users
                .get(&session.user_id)
                .cloned()
                .expect("session user should exist");
            Ok(Some((session.clone(), user)))
        }

        async fn update_expiry(
            &self,
            id: &str,
            expires_at: Timestamp,
        ) -> Result<bool, StoreError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            let mut sessions = self.sessions.lock().unwrap();
            match sessions.get_mut(id) {
                Some(session) => {
                    session.expires_at = expires_at;
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        async fn delete(&self, id: &str) -> Result<(), StoreError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.sessions.lock().unwrap().remove(id);
            Ok(())
        }
    }

    fn manager() -> (SessionManager, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::default());
        (SessionManager::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_create_then_validate_binds_user() {
        let (manager, store) = manager();
        store.add_user(7);

        let token = generate_session_token();
        let created = manager.create_session(&token, 7).await.unwrap();

        let ttl = Duration::minutes(SESSION_TTL_MINS);
        let drift = created.expires_at - (Utc::now() + ttl);
        assert!(drift.num_seconds().abs() < 5, "expiry must be ~now + TTL");

        let auth = manager
            .validate(Some(&token))
            .await
            .unwrap()
            .expect("fresh session must validate");
        assert_eq!(auth.user.id, 7);
        assert_eq!(auth.session.id, created.id);
        assert!(!auth.renewed, "fresh session must not renew");
    }

    #[tokio::test]
    async fn test_no_token_is_anonymous_without_store_access() {
        let (manager, store) = manager();

        let result = manager.validate(None).await.unwrap();
        assert!(result.is_none());
        assert_eq!(store.read_count(), 0);
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_token_is_anonymous() {
        let (manager, _store) = manager();
        let result = manager
            .validate(Some("nosuchtokennosuchtokennosuchtoke"))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_expired_session_is_consumed() {
        let (manager, store) = manager();
        store.add_user(1);

        let token = generate_session_token();
        let session = manager.create_session(&token, 1).await.unwrap();
        store.set_expires_at(&session.id, Utc::now() - Duration::seconds(1));

        let result = manager.validate(Some(&token)).await.unwrap();
        assert!(result.is_none(), "expired session must be anonymous");

        // Destructive read: the row is gone, a second validate still fails.
        assert!(store.expires_at(&session.id).is_none());
        assert!(manager.validate(Some(&token)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_renewal_inside_window() {
        let (manager, store) = manager();
        store.add_user(1);

        let token = generate_session_token();
        let session = manager.create_session(&token, 1).await.unwrap();
        // 5 minutes left: inside the 20-minute renewal window.
        store.set_expires_at(&session.id, Utc::now() + Duration::minutes(5));

        let auth = manager
            .validate(Some(&token))
            .await
            .unwrap()
            .expect("session must still be valid");
        assert!(auth.renewed, "validation inside the window must renew");

        let expected = Utc::now() + Duration::minutes(SESSION_TTL_MINS);
        let drift = auth.session.expires_at - expected;
        assert!(drift.num_seconds().abs() < 5);

        // The store reflects the extension, not just the returned value.
        let stored = store.expires_at(&session.id).unwrap();
        assert_eq!(stored, auth.session.expires_at);
    }

    #[tokio::test]
    async fn test_no_write_outside_renewal_window() {
        let (manager, store) = manager();
        store.add_user(1);

        let token = generate_session_token();
        let session = manager.create_session(&token, 1).await.unwrap();
        let original_expiry = store.expires_at(&session.id).unwrap();
        let writes_before = store.write_count();

        let auth = manager.validate(Some(&token)).await.unwrap().unwrap();
        assert!(!auth.renewed);
        assert_eq!(auth.session.expires_at, original_expiry);
        assert_eq!(
            store.write_count(),
            writes_before,
            "validation outside the window must not write"
        );
    }

    #[tokio::test]
    async fn test_invalidate_is_idempotent() {
        let (manager, store) = manager();
        store.add_user(1);

        let token = generate_session_token();
        manager.create_session(&token, 1).await.unwrap();

        manager.invalidate(&token).await.unwrap();
        assert!(manager.validate(Some(&token)).await.unwrap().is_none());

        // Invalidating again, or invalidating an unknown token, succeeds.
        manager.invalidate(&token).await.unwrap();
        manager.invalidate("neverissuedtokenneverissuedtoken").await.unwrap();
    }

    #[tokio::test]
    async fn test_duplicate_session_id_conflicts() {
        let (manager, store) = manager();
        store.add_user(1);

        let token = generate_session_token();
        manager.create_session(&token, 1).await.unwrap();
        let err = manager.create_session(&token, 1).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict));
    }

    /// End-to-end: create -> renew at TTL-10m -> lapse past the new expiry.
    #[tokio::test]
    async fn test_lifecycle_renew_then_lapse() {
        let (manager, store) = manager();
        store.add_user(1);

        let token = generate_session_token();
        let session = manager.create_session(&token, 1).await.unwrap();

        // Advance the clock to TTL - 10 minutes (10 minutes left).
        store.set_expires_at(&session.id, Utc::now() + Duration::minutes(10));
        let auth = manager.validate(Some(&token)).await.unwrap().unwrap();
        assert!(auth.renewed);
        let expected = Utc::now() + Duration::minutes(SESSION_TTL_MINS);
        assert!((auth.session.expires_at - expected).num_seconds().abs() < 5);

        // Advance past the renewed expiry.
        store.set_expires_at(&session.id, Utc::now() - Duration::seconds(1));
        assert!(manager.validate(Some(&token)).await.unwrap().is_none());
        assert!(store.expires_at(&session.id).is_none(), "row must be gone");
    }
}
