//! Request middleware.
//!
//! - [`session::session_layer`] -- resolves the session cookie on every
//!   request and reflects lifecycle changes back to the client.
//! - [`session::CurrentUser`] -- extractor for handlers that require an
//!   authenticated session.

pub mod session;
