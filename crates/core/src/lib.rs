//! Shared domain types, errors, and validation rules for the Wicket
//! user-directory service.

pub mod error;
pub mod types;
pub mod validation;
