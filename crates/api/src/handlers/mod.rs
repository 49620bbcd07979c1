//! Request handlers.
//!
//! Each submodule provides async handler functions for one resource.
//! Handlers delegate to the repositories in `wicket_db` and to the
//! session manager, and map errors via [`crate::error::AppError`].

pub mod auth;
pub mod profile;
pub mod setup;
pub mod users;
