//! Cookie transport for session tokens.
//!
//! The cookie carries the raw bearer token (never the derived session
//! id), `HttpOnly`, scoped to the whole application path. Its lifetime
//! always mirrors the session's `expires_at`; clearing uses
//! `SameSite=Strict` since no further cross-site navigation into an
//! authenticated state is expected.

use axum::http::header::{HeaderMap, HeaderValue, InvalidHeaderValue, COOKIE};
use chrono::Utc;
use wicket_core::types::Timestamp;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "session";

/// Build a `Set-Cookie` value binding `token` to the browser until
/// `expires_at`.
pub fn session_cookie(
    token: &str,
    expires_at: Timestamp,
    secure: bool,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let max_age = (expires_at - Utc::now()).num_seconds().max(0);
    let mut cookie =
        format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Build a `Set-Cookie` value that removes the session cookie.
pub fn clear_session_cookie(secure: bool) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Extract the session token from the `Cookie` request header, if any.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let Some((key, val)) = pair.trim().split_once('=') else {
            continue;
        };
        if key.trim() == SESSION_COOKIE && !val.trim().is_empty() {
            return Some(val.trim().to_string());
        }
    }
    None
}
