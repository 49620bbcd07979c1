use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use wicket_api::auth::password::hash_password;
use wicket_api::auth::session::{PgSessionStore, SessionManager};
use wicket_api::config::ServerConfig;
use wicket_api::router::build_app_router;
use wicket_api::state::AppState;
use wicket_db::models::user::{CreateUser, User};
use wicket_db::repositories::UserRepo;

/// Build a test `ServerConfig` with safe defaults.
///
/// Each call gets its own setup-marker path under the system temp dir so
/// parallel tests never observe each other's first-run state.
pub fn test_config() -> ServerConfig {
    let marker = std::env::temp_dir().join(format!(
        "wicket-test-setup-{}.marker",
        wicket_api::auth::token::generate_session_token()
    ));

    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        cookie_secure: false,
        setup_marker: marker,
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool.
///
/// Delegates to the same [`build_app_router`] that `main.rs` uses, so
/// integration tests exercise the production middleware stack including
/// session resolution.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_config(pool, test_config())
}

/// Variant of [`build_test_app`] for tests that need to inspect or reuse
/// the configuration (e.g. the setup marker path).
pub fn build_test_app_with_config(pool: PgPool, config: ServerConfig) -> Router {
    let sessions = SessionManager::new(Arc::new(PgSessionStore::new(pool.clone())));
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        sessions,
    };

    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Insert an activated user directly through the repository and return
/// the row plus the plaintext password.
pub async fn seed_user(pool: &PgPool, username: &str) -> (User, String) {
    let password = "Sup3rSecret!";
    let hashed = hash_password(password).expect("hashing should succeed");
    let input = CreateUser {
        username: username.to_string(),
        firstname: "Test".to_string(),
        lastname: "User".to_string(),
        email: Some(format!("{username}@test.com")),
        password_hash: Some(hashed),
    };
    let user = UserRepo::create(pool, &input)
        .await
        .expect("user creation should succeed");
    (user, password.to_string())
}

/// Log in through the API and return the session token from the cookie.
pub async fn login_session(app: Router, username: &str, password: &str) -> String {
    let body = serde_json::json!({ "username": username, "password": password });
    let response = post_json(app, "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), axum::http::StatusCode::OK);
    session_cookie(&response).expect("login must set the session cookie")
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
    session_token: Option<&str>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = session_token {
        builder = builder.header(COOKIE, format!("session={token}"));
    }

    let request = match body {
        Some(json) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    app.oneshot(request).await.unwrap()
}

/// GET `uri` without a session cookie.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

/// GET `uri` with the given session token in the cookie.
pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, Some(token)).await
}

/// POST a JSON body without a session cookie.
pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(body), None).await
}

/// POST a JSON body with the given session token in the cookie.
pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(body), Some(token)).await
}

/// POST with an empty body and the given session token in the cookie.
pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::POST, uri, None, Some(token)).await
}

/// PUT a JSON body with the given session token in the cookie.
pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::PUT, uri, Some(body), Some(token)).await
}

/// DELETE `uri` with the given session token in the cookie.
pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, None, Some(token)).await
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("response body should be valid JSON")
}

/// Extract the session token from a response's `Set-Cookie` header.
///
/// Returns `None` when no `session=` cookie was set; returns `Some("")`
/// when the cookie was cleared.
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    let value = response.headers().get(SET_COOKIE)?.to_str().ok()?;
    let rest = value.strip_prefix("session=")?;
    Some(rest.split(';').next().unwrap_or("").to_string())
}

/// The `Max-Age` attribute of a response's `Set-Cookie` header, in seconds.
pub fn cookie_max_age(response: &Response<Body>) -> Option<i64> {
    let value = response.headers().get(SET_COOKIE)?.to_str().ok()?;
    value
        .split(';')
        .map(str::trim)
        .find_map(|attr| attr.strip_prefix("Max-Age="))
        .and_then(|v| v.parse().ok())
}
