//! Session resolution middleware and the authenticated-user extractor.
//!
//! The layer runs on every request: it reads the session cookie,
//! validates the token (applying lazy expiration and sliding renewal),
//! stashes the result in request extensions, and on the way out keeps
//! the browser's cookie in step with the server-side session -- fresh
//! expiry while authenticated, cleared when a presented token was
//! rejected.

use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::SET_COOKIE;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use wicket_core::error::CoreError;
use wicket_db::models::session::Session;
use wicket_db::models::user::User;

use crate::auth::cookie;
use crate::error::AppError;
use crate::state::AppState;

/// The authenticated session attached to a request's extensions.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub session: Session,
    pub user: User,
}

/// Resolve the session cookie and maintain it across the response.
pub async fn session_layer(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = cookie::session_token(request.headers());

    // A store failure is a hard 500: infrastructure faults must not be
    // rendered as a logged-out state.
    let validated = match state.sessions.validate(token.as_deref()).await {
        Ok(validated) => validated,
        Err(err) => return AppError::from(err).into_response(),
    };

    if let Some(auth) = &validated {
        request.extensions_mut().insert(AuthContext {
            session: auth.session.clone(),
            user: auth.user.clone(),
        });
    }

    let mut response = next.run(request).await;

    // Handlers that manage the cookie themselves (login, logout, setup)
    // take precedence.
    if has_session_set_cookie(response.headers()) {
        return response;
    }

    let secure = state.config.cookie_secure;
    match (token, validated) {
        // Valid session: reissue the same token with the current expiry,
        // which also carries any sliding renewal to the browser.
        (Some(token), Some(auth)) => {
            if let Ok(value) = cookie::session_cookie(&token, auth.session.expires_at, secure) {
                response.headers_mut().append(SET_COOKIE, value);
            }
        }
        // Token presented but rejected (unknown or expired): clear it.
        (Some(_), None) => {
            if let Ok(value) = cookie::clear_session_cookie(secure) {
                response.headers_mut().append(SET_COOKIE, value);
            }
        }
        // Anonymous request: nothing to reflect.
        (None, _) => {}
    }

    response
}

/// Whether the response already sets the session cookie.
fn has_session_set_cookie(headers: &HeaderMap) -> bool {
    headers.get_all(SET_COOKIE).iter().any(|value| {
        value
            .to_str()
            .map(|s| s.starts_with("session="))
            .unwrap_or(false)
    })
}

/// Authenticated user extracted from the request extensions populated by
/// [`session_layer`].
///
/// Use this as an extractor parameter in any handler that requires
/// authentication; anonymous requests are rejected with 401.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub session: Session,
    pub user: User,
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(|ctx| CurrentUser {
                session: ctx.session,
                user: ctx.user,
            })
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized("Authentication required".into()))
            })
    }
}
