//! Authentication primitives and the session lifecycle core.
//!
//! - [`token`] -- opaque bearer-token generation and session-id derivation.
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`session`] -- session store contract and the lifecycle manager
//!   (creation, validation, sliding renewal, invalidation).
//! - [`cookie`] -- the cookie-transport contract binding a token to a
//!   browser.

pub mod cookie;
pub mod password;
pub mod session;
pub mod token;
